// 👀 Observers - fan-out of shipment changes
//
// A shipment calls `notify` on every registered observer, synchronously and
// on the caller's thread, after each successful mutation. Observers only see
// a shared reference; they never own the shipment.

use crate::entities::Shipment;
use crate::rules::CalendarZone;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Status shown before the first notification arrives
pub const UNTRACKED_STATUS: &str = "N/A";

pub trait ShipmentObserver: Send + Sync {
    fn notify(&self, shipment: &Shipment);
}

// ============================================================================
// TRACKER VIEW
// ============================================================================

/// Display-friendly projection of a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerView {
    pub shipment_id: String,
    pub shipment_type: Option<String>,
    pub status: String,
    pub current_location: Option<String>,

    /// Expected delivery rendered in the tracker's calendar zone
    pub expected_delivery: Option<String>,
    pub notes: Vec<String>,

    /// History entries rendered in record format
    pub update_history: Vec<String>,
    pub rule_violations: Vec<String>,
}

impl TrackerView {
    pub fn new(shipment_id: &str) -> Self {
        TrackerView {
            shipment_id: shipment_id.to_string(),
            shipment_type: None,
            status: UNTRACKED_STATUS.to_string(),
            current_location: None,
            expected_delivery: None,
            notes: Vec::new(),
            update_history: Vec::new(),
            rule_violations: Vec::new(),
        }
    }

    /// Project the current state of a shipment
    pub fn project(shipment: &Shipment, zone: CalendarZone) -> Self {
        TrackerView {
            shipment_id: shipment.id().to_string(),
            shipment_type: Some(shipment.shipment_type().to_string()),
            status: shipment.status().to_string(),
            current_location: shipment.current_location().map(str::to_string),
            expected_delivery: shipment
                .expected_delivery()
                .map(|millis| zone.format(millis).unwrap_or_else(|| millis.to_string())),
            notes: shipment.notes().to_vec(),
            update_history: shipment
                .update_history()
                .iter()
                .map(|update| update.to_record())
                .collect(),
            rule_violations: shipment.rule_violations().to_vec(),
        }
    }

    /// Back to the untracked defaults, keeping the id
    pub fn reset(&mut self) {
        *self = TrackerView::new(&self.shipment_id);
    }

    pub fn has_violations(&self) -> bool {
        !self.rule_violations.is_empty()
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Observer that keeps the latest TrackerView of one shipment
pub struct Tracker {
    shipment_id: String,
    zone: CalendarZone,
    view: RwLock<TrackerView>,
}

impl Tracker {
    pub fn new(shipment_id: &str, zone: CalendarZone) -> Self {
        Tracker {
            shipment_id: shipment_id.to_string(),
            zone,
            view: RwLock::new(TrackerView::new(shipment_id)),
        }
    }

    pub fn shipment_id(&self) -> &str {
        &self.shipment_id
    }

    /// Copy of the last projected state
    pub fn view(&self) -> TrackerView {
        self.view.read().clone()
    }

    pub fn reset(&self) {
        self.view.write().reset();
    }
}

impl ShipmentObserver for Tracker {
    fn notify(&self, shipment: &Shipment) {
        if shipment.id() != self.shipment_id {
            tracing::warn!(
                expected = %self.shipment_id,
                received = %shipment.id(),
                "tracker received update for another shipment"
            );
            return;
        }

        let projected = TrackerView::project(shipment, self.zone);
        tracing::debug!(
            shipment_id = %shipment.id(),
            status = %projected.status,
            notes = projected.notes.len(),
            history = projected.update_history.len(),
            "tracker refreshed"
        );
        *self.view.write() = projected;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ShipmentType;
    use crate::update::ShipmentUpdate;
    use std::sync::Arc;

    #[test]
    fn test_new_view_defaults() {
        let view = TrackerView::new("VIEW_001");

        assert_eq!(view.shipment_id, "VIEW_001");
        assert_eq!(view.status, UNTRACKED_STATUS);
        assert!(view.current_location.is_none());
        assert!(view.expected_delivery.is_none());
        assert!(view.notes.is_empty());
        assert!(view.update_history.is_empty());
        assert!(!view.has_violations());
    }

    #[test]
    fn test_tracker_projects_shipment_state() {
        let mut shipment = Shipment::new("T1", ShipmentType::Express, 0);
        shipment.set_status("Created");
        shipment.set_current_location("Warehouse A");
        shipment.set_expected_delivery(Some(86_400_000));
        shipment.add_note("Initial note.");
        shipment.add_update(ShipmentUpdate::new("created", "T1", 1000));

        let tracker = Arc::new(Tracker::new("T1", CalendarZone::utc()));
        shipment.add_observer(tracker.clone());
        shipment.notify_observers();

        let view = tracker.view();
        assert_eq!(view.status, "Created");
        assert_eq!(view.shipment_type.as_deref(), Some("EXPRESS"));
        assert_eq!(view.current_location.as_deref(), Some("Warehouse A"));
        assert_eq!(view.expected_delivery.as_deref(), Some("1970-01-02 00:00:00"));
        assert_eq!(view.notes, vec!["Initial note.".to_string()]);
        assert_eq!(view.update_history, vec!["created,T1,1000".to_string()]);
    }

    #[test]
    fn test_tracker_ignores_other_shipments() {
        let tracker = Tracker::new("T1", CalendarZone::utc());
        let mut other = Shipment::new("T2", ShipmentType::Standard, 0);
        other.set_status("Shipped");

        tracker.notify(&other);

        assert_eq!(tracker.view().status, UNTRACKED_STATUS);
    }

    #[test]
    fn test_removed_tracker_keeps_last_state() {
        let mut shipment = Shipment::new("T1", ShipmentType::Standard, 0);
        let tracker = Arc::new(Tracker::new("T1", CalendarZone::utc()));
        let id = shipment.add_observer(tracker.clone());

        shipment.set_status("Created");
        shipment.notify_observers();
        shipment.remove_observer(id);
        shipment.set_status("Delivered");
        shipment.notify_observers();

        assert_eq!(tracker.view().status, "Created");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut shipment = Shipment::new("T1", ShipmentType::Standard, 0);
        shipment.set_status("Lost");
        let tracker = Tracker::new("T1", CalendarZone::utc());
        tracker.notify(&shipment);
        assert_eq!(tracker.view().status, "Lost");

        tracker.reset();

        assert_eq!(tracker.view(), TrackerView::new("T1"));
    }
}
