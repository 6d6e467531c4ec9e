// ⚙️ Tracking Processor - raw record in, result message out
//
// parse → create-or-look-up → dispatch by tag → strategy mutates → observers
//
// This is the single boundary where every error kind is turned into a
// human-readable result string. Nothing below it panics on bad input.

use crate::entities::{Shipment, ShipmentFactory, ShipmentRegistry, ShipmentType};
use crate::error::{Result, TrackingError};
use crate::rules::RuleValidator;
use crate::strategies::{StrategyTable, CREATED};
use crate::update::ShipmentUpdate;
use parking_lot::Mutex;
use std::sync::Arc;

/// Processor behind one coarse lock, for adapters that share it across threads
pub type SharedProcessor = Arc<Mutex<TrackingProcessor>>;

pub struct TrackingProcessor {
    registry: ShipmentRegistry,
    strategies: StrategyTable,
    rules: RuleValidator,
}

impl TrackingProcessor {
    pub fn new(rules: RuleValidator) -> Self {
        TrackingProcessor {
            registry: ShipmentRegistry::new(),
            strategies: StrategyTable::new(rules),
            rules,
        }
    }

    /// Processor over an existing registry and strategy table
    pub fn with_parts(registry: ShipmentRegistry, strategies: StrategyTable, rules: RuleValidator) -> Self {
        TrackingProcessor {
            registry,
            strategies,
            rules,
        }
    }

    pub fn into_shared(self) -> SharedProcessor {
        Arc::new(Mutex::new(self))
    }

    pub fn rules(&self) -> RuleValidator {
        self.rules
    }

    pub fn registry(&self) -> &ShipmentRegistry {
        &self.registry
    }

    pub fn find_shipment(&self, id: &str) -> Option<&Shipment> {
        self.registry.find_by_id(id)
    }

    /// Mutable access, e.g. to attach or detach observers
    pub fn find_shipment_mut(&mut self, id: &str) -> Option<&mut Shipment> {
        self.registry.find_by_id_mut(id)
    }

    pub fn shipment_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Forget every shipment (test helper)
    pub fn reset(&mut self) {
        self.registry.reset();
    }

    /// Apply one raw record and describe the outcome
    pub fn process(&mut self, line: &str) -> String {
        result_message(&self.try_process(line))
    }

    /// Apply one raw record; returns the id of the updated shipment
    pub fn try_process(&mut self, line: &str) -> Result<String> {
        let outcome = ShipmentUpdate::parse(line).and_then(|update| self.apply(update));
        if let Err(err) = &outcome {
            tracing::error!(line, "failed to process update: {}", err);
        }
        outcome
    }

    /// Dispatch an already parsed update
    pub fn apply(&mut self, update: ShipmentUpdate) -> Result<String> {
        let shipment_id = update.shipment_id.clone();

        if update.update_type == CREATED {
            if self.registry.contains(&shipment_id) {
                tracing::info!(shipment_id = %shipment_id, "shipment already exists, applying 'created' again");
            } else {
                let type_tag = update.info().unwrap_or(ShipmentType::Standard.as_str());
                let shipment = ShipmentFactory::create(&shipment_id, type_tag, update.timestamp)?;
                tracing::info!(
                    shipment_id = %shipment_id,
                    shipment_type = %shipment.shipment_type(),
                    "created new shipment"
                );
                self.registry.register(shipment);
            }
        }

        let shipment = self
            .registry
            .find_by_id_mut(&shipment_id)
            .ok_or_else(|| TrackingError::ShipmentNotFound(shipment_id.clone()))?;

        let strategy = self
            .strategies
            .get(&update.update_type)
            .ok_or_else(|| TrackingError::UnknownUpdateType(update.update_type.clone()))?;

        strategy.apply(shipment, &update);
        tracing::info!(
            shipment_id = %shipment_id,
            update_type = %update.update_type,
            status = %shipment.status(),
            "processed update"
        );

        Ok(shipment_id)
    }
}

impl Default for TrackingProcessor {
    fn default() -> Self {
        Self::new(RuleValidator::default())
    }
}

/// Human-readable message for a processing outcome
pub fn result_message(outcome: &Result<String>) -> String {
    match outcome {
        Ok(id) => format!("Success: Update processed for {}.", id),
        Err(TrackingError::ShipmentNotFound(id)) => format!("Error: Shipment {} not found.", id),
        Err(TrackingError::UnknownUpdateType(tag)) => format!("Error: Unknown update type '{}'.", tag),
        Err(err) => format!("Error processing update: {}", err),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{ShipmentObserver, Tracker};
    use crate::rules::CalendarZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn processor() -> TrackingProcessor {
        TrackingProcessor::new(RuleValidator::new(CalendarZone::utc()))
    }

    struct Counter(AtomicUsize);

    impl ShipmentObserver for Counter {
        fn notify(&self, _shipment: &Shipment) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_created_defaults_to_standard() {
        let mut processor = processor();

        let response = processor.process("created,TS_001,1678886400000");

        assert_eq!(response, "Success: Update processed for TS_001.");
        let shipment = processor.find_shipment("TS_001").unwrap();
        assert_eq!(shipment.shipment_type(), ShipmentType::Standard);
        assert_eq!(shipment.status(), "Created");
        assert_eq!(shipment.created_timestamp(), 1_678_886_400_000);
        assert_eq!(shipment.update_history().len(), 1);
        assert!(shipment.rule_violations().is_empty());
    }

    #[test]
    fn test_created_with_each_type() {
        let mut processor = processor();

        for (id, tag, expected) in [
            ("TS_002", "EXPRESS", ShipmentType::Express),
            ("TS_003", "overnight", ShipmentType::Overnight),
            ("TS_004", "Bulk", ShipmentType::Bulk),
        ] {
            let response = processor.process(&format!("created,{},1678886400000,{}", id, tag));
            assert_eq!(response, format!("Success: Update processed for {}.", id));
            assert_eq!(processor.find_shipment(id).unwrap().shipment_type(), expected);
        }
    }

    #[test]
    fn test_created_with_unknown_type_is_rejected() {
        let mut processor = processor();

        let response = processor.process("created,TS_005,1678886400000,PRIORITY");

        assert!(response.starts_with("Error processing update:"));
        assert!(response.contains("PRIORITY"));
        assert!(processor.find_shipment("TS_005").is_none());
    }

    #[test]
    fn test_recreate_is_idempotent() {
        let mut processor = processor();
        processor.process("created,S1,1000,EXPRESS");
        processor.process("shipped,S1,2000");

        let response = processor.process("created,S1,5000,BULK");

        assert_eq!(response, "Success: Update processed for S1.");
        let shipment = processor.find_shipment("S1").unwrap();
        assert_eq!(shipment.shipment_type(), ShipmentType::Express);
        assert_eq!(shipment.created_timestamp(), 1000);
        assert_eq!(shipment.status(), "Created");
        assert_eq!(shipment.update_history().len(), 3);
    }

    #[test]
    fn test_express_scenario_more_than_three_days() {
        let mut processor = processor();
        processor.process("created,S1,1700000000000,EXPRESS");

        let response = processor.process("shipped,S1,1700000100000,1700400000000");

        assert_eq!(response, "Success: Update processed for S1.");
        let shipment = processor.find_shipment("S1").unwrap();
        assert_eq!(shipment.rule_violations().len(), 1);
        assert!(shipment.rule_violations()[0].contains("more than 3 days"));
    }

    #[test]
    fn test_overnight_delayed_scenario() {
        let mut processor = processor();
        processor.process("created,S2,1700000000000,OVERNIGHT");

        processor.process("delayed,S2,1700000100000,1700500000000");

        let shipment = processor.find_shipment("S2").unwrap();
        assert_eq!(shipment.status(), "Delayed");
        assert!(shipment.rule_violations().is_empty());
    }

    #[test]
    fn test_update_for_unknown_shipment_never_creates_it() {
        let mut processor = processor();

        let response = processor.process("location,S3,1700000000000,Seattle WA");

        assert_eq!(response, "Error: Shipment S3 not found.");
        assert!(processor.find_shipment("S3").is_none());
        assert!(processor.registry().is_empty());
    }

    #[test]
    fn test_unknown_update_type() {
        let mut processor = processor();
        processor.process("created,S1,1");

        let response = processor.process("teleported,S1,2,Mars");

        assert_eq!(response, "Error: Unknown update type 'teleported'.");
        assert_eq!(processor.find_shipment("S1").unwrap().update_history().len(), 1);
    }

    #[test]
    fn test_unknown_tag_on_missing_shipment_reports_not_found() {
        let mut processor = processor();
        let outcome = processor.try_process("teleported,S9,2");
        assert_eq!(outcome, Err(TrackingError::ShipmentNotFound("S9".to_string())));
    }

    #[test]
    fn test_parse_failures_become_messages() {
        let mut processor = processor();

        let response = processor.process("created,S1");
        assert!(response.starts_with("Error processing update: Invalid update line format"));

        let response = processor.process("created,S1,notatime");
        assert!(response.starts_with("Error processing update: Invalid timestamp"));
    }

    #[test]
    fn test_note_with_commas_scenario() {
        let mut processor = processor();
        processor.process("created,S1,1700000000000");

        processor.process("noteadded,S1,1700000200000,Fragile, handle with care");

        let shipment = processor.find_shipment("S1").unwrap();
        assert_eq!(shipment.notes(), ["Fragile, handle with care".to_string()]);
    }

    #[test]
    fn test_removed_observer_scenario() {
        let mut processor = processor();
        processor.process("created,S1,1700000000000");

        let removed = Arc::new(Counter(AtomicUsize::new(0)));
        let kept = Arc::new(Tracker::new("S1", CalendarZone::utc()));
        let shipment = processor.find_shipment_mut("S1").unwrap();
        let removed_id = shipment.add_observer(removed.clone());
        shipment.add_observer(kept.clone());

        processor.process("shipped,S1,1700000100000");
        assert!(processor.find_shipment_mut("S1").unwrap().remove_observer(removed_id));
        processor.process("delivered,S1,1700000200000");

        assert_eq!(removed.0.load(Ordering::SeqCst), 1);
        assert_eq!(kept.view().status, "Delivered");
        assert_eq!(kept.view().update_history.len(), 3);
    }

    #[test]
    fn test_independent_processors_do_not_share_state() {
        let mut first = processor();
        let second = processor();

        first.process("created,S1,1");

        assert!(first.find_shipment("S1").is_some());
        assert!(second.find_shipment("S1").is_none());
    }

    #[test]
    fn test_reset_and_ids() {
        let mut processor = processor();
        processor.process("created,B,1");
        processor.process("created,A,1");
        assert_eq!(processor.shipment_ids(), vec!["A".to_string(), "B".to_string()]);

        processor.reset();
        assert!(processor.shipment_ids().is_empty());
    }

    #[test]
    fn test_shared_processor_across_threads() {
        let shared = processor().into_shared();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let line = format!("created,S{},{}", i, i);
                    shared.lock().process(&line)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().starts_with("Success"));
        }
        assert_eq!(shared.lock().registry().count(), 4);
    }
}
