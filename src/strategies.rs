// 🔀 Update Strategies - one mutation rule per update-type tag
//
// Every strategy follows the same sequence:
//   1. mutate the relevant field(s)
//   2. append the update to the shipment's history
//   3. notify observers (always last)

use crate::entities::Shipment;
use crate::error::TrackingError;
use crate::rules::RuleValidator;
use crate::update::ShipmentUpdate;
use std::collections::HashMap;

pub const CREATED: &str = "created";
pub const SHIPPED: &str = "shipped";
pub const LOCATION: &str = "location";
pub const DELAYED: &str = "delayed";
pub const DELIVERED: &str = "delivered";
pub const LOST: &str = "lost";
pub const CANCELED: &str = "canceled";
pub const NOTE_ADDED: &str = "noteadded";

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

pub trait UpdateStrategy: Send + Sync {
    /// Tag this strategy is registered under
    fn update_type(&self) -> &'static str;

    /// Mutate the shipment, record the update and notify observers
    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate);
}

/// Steps 2 and 3, shared by every strategy
fn record_and_notify(shipment: &mut Shipment, update: &ShipmentUpdate) {
    shipment.add_update(update.clone());
    shipment.notify_observers();
}

/// Status strategies that touch nothing else
macro_rules! status_strategy {
    ($name:ident, $tag:expr, $status:expr) => {
        pub struct $name;

        impl UpdateStrategy for $name {
            fn update_type(&self) -> &'static str {
                $tag
            }

            fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
                shipment.set_status($status);
                record_and_notify(shipment, update);
            }
        }
    };
}

status_strategy!(CreatedStrategy, CREATED, "Created");
status_strategy!(LostStrategy, LOST, "Lost");
status_strategy!(CanceledStrategy, CANCELED, "Canceled");

// ============================================================================
// DELIVERY-BEARING STRATEGIES
// ============================================================================

/// Read a new expected delivery from the payload and re-run the delivery rules.
///
/// A payload that is not an integer is logged and leaves the timestamp and
/// the violations untouched; the rest of the strategy still runs.
fn apply_expected_delivery(rules: &RuleValidator, shipment: &mut Shipment, update: &ShipmentUpdate) {
    let raw = match update.info() {
        Some(raw) => raw,
        None => return,
    };

    match raw.parse::<i64>() {
        Ok(expected) => {
            shipment.set_expected_delivery(Some(expected));
            let violations = rules.validate(
                shipment.shipment_type(),
                shipment.created_timestamp(),
                expected,
                &update.update_type,
            );
            shipment.replace_violations(violations);
        }
        Err(_) => {
            let err = TrackingError::InvalidPayload {
                shipment_id: shipment.id().to_string(),
                value: raw.to_string(),
            };
            tracing::warn!(update_type = %update.update_type, "{}", err);
        }
    }
}

pub struct ShippedStrategy {
    rules: RuleValidator,
}

impl ShippedStrategy {
    pub fn new(rules: RuleValidator) -> Self {
        ShippedStrategy { rules }
    }
}

impl UpdateStrategy for ShippedStrategy {
    fn update_type(&self) -> &'static str {
        SHIPPED
    }

    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
        shipment.set_status("Shipped");
        apply_expected_delivery(&self.rules, shipment, update);
        record_and_notify(shipment, update);
    }
}

/// Same as shipped, but the "delayed" tag exempts overnight shipments from the 1-day rule
pub struct DelayedStrategy {
    rules: RuleValidator,
}

impl DelayedStrategy {
    pub fn new(rules: RuleValidator) -> Self {
        DelayedStrategy { rules }
    }
}

impl UpdateStrategy for DelayedStrategy {
    fn update_type(&self) -> &'static str {
        DELAYED
    }

    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
        shipment.set_status("Delayed");
        apply_expected_delivery(&self.rules, shipment, update);
        record_and_notify(shipment, update);
    }
}

// ============================================================================
// FIELD STRATEGIES
// ============================================================================

pub struct LocationStrategy;

impl UpdateStrategy for LocationStrategy {
    fn update_type(&self) -> &'static str {
        LOCATION
    }

    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
        if let Some(location) = update.info() {
            shipment.set_current_location(location);
        }
        record_and_notify(shipment, update);
    }
}

pub struct DeliveredStrategy;

impl UpdateStrategy for DeliveredStrategy {
    fn update_type(&self) -> &'static str {
        DELIVERED
    }

    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
        shipment.set_status("Delivered");
        shipment.set_expected_delivery(None);
        record_and_notify(shipment, update);
    }
}

pub struct NoteAddedStrategy;

impl UpdateStrategy for NoteAddedStrategy {
    fn update_type(&self) -> &'static str {
        NOTE_ADDED
    }

    fn apply(&self, shipment: &mut Shipment, update: &ShipmentUpdate) {
        // whole remainder, commas included
        if let Some(note) = update.info() {
            shipment.add_note(note);
        }
        record_and_notify(shipment, update);
    }
}

// ============================================================================
// STRATEGY TABLE
// ============================================================================

/// Dispatch table from update-type tag to strategy
pub struct StrategyTable {
    strategies: HashMap<&'static str, Box<dyn UpdateStrategy>>,
}

impl StrategyTable {
    /// Table with no strategies at all
    pub fn empty() -> Self {
        StrategyTable {
            strategies: HashMap::new(),
        }
    }

    /// Table with the eight standard strategies
    pub fn new(rules: RuleValidator) -> Self {
        let mut table = StrategyTable::empty();
        table.register(Box::new(CreatedStrategy));
        table.register(Box::new(ShippedStrategy::new(rules)));
        table.register(Box::new(LocationStrategy));
        table.register(Box::new(DelayedStrategy::new(rules)));
        table.register(Box::new(DeliveredStrategy));
        table.register(Box::new(LostStrategy));
        table.register(Box::new(CanceledStrategy));
        table.register(Box::new(NoteAddedStrategy));
        table
    }

    /// Add or replace the strategy for its tag
    pub fn register(&mut self, strategy: Box<dyn UpdateStrategy>) {
        self.strategies.insert(strategy.update_type(), strategy);
    }

    pub fn get(&self, update_type: &str) -> Option<&dyn UpdateStrategy> {
        self.strategies.get(update_type).map(|strategy| strategy.as_ref())
    }

    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.strategies.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::new(RuleValidator::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
