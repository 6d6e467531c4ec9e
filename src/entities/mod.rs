// Entity Models
//
// Each shipment has a stable identity (id, type, creation time) and a set of
// values that updates move over time. The registry owns every live shipment.

pub mod shipment;
pub mod registry;

pub use shipment::{ObserverId, Shipment, ShipmentFactory, ShipmentType, INITIAL_STATUS};
pub use registry::ShipmentRegistry;
