// 📦 Shipment Entity - aggregate root for one tracked shipment
//
// Identity: id, type and creation time never change.
// Values: status, location, expected delivery, notes, history and
// violations move as updates arrive. Only strategies mutate them.

use crate::error::{Result, TrackingError};
use crate::observer::ShipmentObserver;
use crate::update::ShipmentUpdate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Status of a shipment the factory created but no strategy has touched yet
pub const INITIAL_STATUS: &str = "Unknown";

// ============================================================================
// SHIPMENT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShipmentType {
    /// No delivery window
    #[default]
    Standard,

    /// Delivered at most 3 days after creation
    Express,

    /// Delivered exactly the next day
    Overnight,

    /// Delivered no sooner than 3 days after creation
    Bulk,
}

impl ShipmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentType::Standard => "STANDARD",
            ShipmentType::Express => "EXPRESS",
            ShipmentType::Overnight => "OVERNIGHT",
            ShipmentType::Bulk => "BULK",
        }
    }

    pub fn all() -> [ShipmentType; 4] {
        [
            ShipmentType::Standard,
            ShipmentType::Express,
            ShipmentType::Overnight,
            ShipmentType::Bulk,
        ]
    }
}

impl fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentType {
    type Err = TrackingError;

    /// Case-insensitive match on the type tag
    fn from_str(tag: &str) -> Result<Self> {
        ShipmentType::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| TrackingError::UnknownShipmentType(tag.to_string()))
    }
}

// ============================================================================
// OBSERVER HANDLE
// ============================================================================

/// Handle returned by `Shipment::add_observer`, used to unregister later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        ObserverId(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SHIPMENT
// ============================================================================

pub struct Shipment {
    id: String,
    shipment_type: ShipmentType,
    created_timestamp: i64,

    status: String,
    expected_delivery: Option<i64>,
    current_location: Option<String>,
    notes: Vec<String>,
    update_history: Vec<ShipmentUpdate>,
    rule_violations: Vec<String>,

    /// Notified in registration order
    observers: Vec<(ObserverId, Arc<dyn ShipmentObserver>)>,
}

impl Shipment {
    pub fn new(id: &str, shipment_type: ShipmentType, created_timestamp: i64) -> Self {
        Shipment {
            id: id.to_string(),
            shipment_type,
            created_timestamp,
            status: INITIAL_STATUS.to_string(),
            expected_delivery: None,
            current_location: None,
            notes: Vec::new(),
            update_history: Vec::new(),
            rule_violations: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shipment_type(&self) -> ShipmentType {
        self.shipment_type
    }

    pub fn created_timestamp(&self) -> i64 {
        self.created_timestamp
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn expected_delivery(&self) -> Option<i64> {
        self.expected_delivery
    }

    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn update_history(&self) -> &[ShipmentUpdate] {
        &self.update_history
    }

    /// Violations from the most recent validation pass only
    pub fn rule_violations(&self) -> &[String] {
        &self.rule_violations
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ------------------------------------------------------------------------
    // Mutators (strategies only)
    // ------------------------------------------------------------------------

    pub(crate) fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    pub(crate) fn set_expected_delivery(&mut self, timestamp: Option<i64>) {
        self.expected_delivery = timestamp;
    }

    pub(crate) fn set_current_location(&mut self, location: &str) {
        self.current_location = Some(location.to_string());
    }

    pub(crate) fn add_note(&mut self, note: &str) {
        self.notes.push(note.to_string());
    }

    pub(crate) fn add_update(&mut self, update: ShipmentUpdate) {
        self.update_history.push(update);
    }

    /// Clear-then-repopulate; never appends across passes
    pub(crate) fn replace_violations(&mut self, violations: Vec<String>) {
        self.rule_violations = violations;
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    pub fn add_observer(&mut self, observer: Arc<dyn ShipmentObserver>) -> ObserverId {
        let id = ObserverId::new();
        self.observers.push((id, observer));
        tracing::debug!(shipment_id = %self.id, observer = %id, "observer registered");
        id
    }

    /// Returns false when the handle was not registered on this shipment
    pub fn remove_observer(&mut self, observer: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != observer);
        let removed = self.observers.len() != before;
        if removed {
            tracing::debug!(shipment_id = %self.id, observer = %observer, "observer removed");
        }
        removed
    }

    pub fn notify_observers(&self) {
        for (_, observer) in &self.observers {
            observer.notify(self);
        }
    }
}

impl fmt::Debug for Shipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shipment")
            .field("id", &self.id)
            .field("shipment_type", &self.shipment_type)
            .field("created_timestamp", &self.created_timestamp)
            .field("status", &self.status)
            .field("expected_delivery", &self.expected_delivery)
            .field("current_location", &self.current_location)
            .field("notes", &self.notes)
            .field("update_history", &self.update_history)
            .field("rule_violations", &self.rule_violations)
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ============================================================================
// SHIPMENT FACTORY
// ============================================================================

pub struct ShipmentFactory;

impl ShipmentFactory {
    /// Build a fresh shipment from a type tag (case-insensitive).
    ///
    /// Status stays "Unknown" until the created strategy runs.
    pub fn create(id: &str, type_tag: &str, created_at: i64) -> Result<Shipment> {
        let shipment_type = type_tag.parse::<ShipmentType>()?;
        Ok(Shipment::new(id, shipment_type, created_at))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(CountingObserver {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ShipmentObserver for CountingObserver {
        fn notify(&self, _shipment: &Shipment) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_factory_matches_case_insensitively() {
        for (tag, expected) in [
            ("standard", ShipmentType::Standard),
            ("Express", ShipmentType::Express),
            ("OVERNIGHT", ShipmentType::Overnight),
            ("bUlK", ShipmentType::Bulk),
        ] {
            let shipment = ShipmentFactory::create("S1", tag, 42).unwrap();
            assert_eq!(shipment.shipment_type(), expected);
            assert_eq!(shipment.created_timestamp(), 42);
            assert_eq!(shipment.status(), INITIAL_STATUS);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_type() {
        let err = ShipmentFactory::create("S1", "Priority", 0).unwrap_err();
        assert_eq!(err, TrackingError::UnknownShipmentType("Priority".to_string()));
    }

    #[test]
    fn test_new_shipment_is_empty() {
        let shipment = Shipment::new("S1", ShipmentType::Bulk, 7);

        assert_eq!(shipment.id(), "S1");
        assert!(shipment.expected_delivery().is_none());
        assert!(shipment.current_location().is_none());
        assert!(shipment.notes().is_empty());
        assert!(shipment.update_history().is_empty());
        assert!(shipment.rule_violations().is_empty());
        assert_eq!(shipment.observer_count(), 0);
    }

    #[test]
    fn test_replace_violations_discards_previous_pass() {
        let mut shipment = Shipment::new("S1", ShipmentType::Express, 0);
        shipment.replace_violations(vec!["old".to_string(), "older".to_string()]);
        shipment.replace_violations(vec!["new".to_string()]);

        assert_eq!(shipment.rule_violations(), ["new".to_string()]);
    }

    #[test]
    fn test_observers_notified_until_removed() {
        let mut shipment = Shipment::new("S1", ShipmentType::Standard, 0);
        let first = CountingObserver::new();
        let second = CountingObserver::new();

        let first_id = shipment.add_observer(first.clone());
        shipment.add_observer(second.clone());

        shipment.notify_observers();
        assert!(shipment.remove_observer(first_id));
        shipment.notify_observers();

        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 2);
        assert!(!shipment.remove_observer(first_id));
    }

    #[test]
    fn test_type_tag_display() {
        assert_eq!(ShipmentType::Overnight.to_string(), "OVERNIGHT");
        assert_eq!("express".parse::<ShipmentType>().unwrap(), ShipmentType::Express);
    }
}
