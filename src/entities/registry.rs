// 🗂️ Shipment Registry - live mapping from shipment id to entity
//
// Explicitly constructed and passed around; there is no process-wide
// instance, so several registries can live side by side.

use super::shipment::Shipment;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ShipmentRegistry {
    shipments: HashMap<String, Shipment>,
}

impl ShipmentRegistry {
    pub fn new() -> Self {
        ShipmentRegistry {
            shipments: HashMap::new(),
        }
    }

    /// Register a shipment under its id.
    ///
    /// Returns the shipment it displaced, if the id was already taken.
    pub fn register(&mut self, shipment: Shipment) -> Option<Shipment> {
        self.shipments.insert(shipment.id().to_string(), shipment)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Shipment> {
        self.shipments.get(id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Shipment> {
        self.shipments.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shipments.contains_key(id)
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shipments.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    /// Drop every shipment (test helper)
    pub fn reset(&mut self) {
        self.shipments.clear();
    }
}
