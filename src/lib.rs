// Shipment Tracker - Core Library
// Exposes the update processing engine for the CLI, the tracking server and tests

pub mod error;
pub mod update;         // Update Parser
pub mod rules;          // Delivery-window validation
pub mod entities;       // Shipment entity, factory and registry
pub mod observer;       // Observer capability + Tracker projection
pub mod strategies;     // One strategy per update-type tag
pub mod processor;      // Registry/Processor boundary
pub mod simulator;      // Batch replay of record files
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, TrackingError};
pub use update::{parse, ShipmentUpdate};
pub use rules::{CalendarZone, RuleValidator};
pub use entities::{
    ObserverId, Shipment, ShipmentFactory, ShipmentRegistry, ShipmentType,
};
pub use observer::{ShipmentObserver, Tracker, TrackerView};
pub use strategies::{StrategyTable, UpdateStrategy};
pub use processor::{result_message, SharedProcessor, TrackingProcessor};
pub use simulator::{read_updates, SimulationReport, TrackingSimulator};
pub use config::{load_config, TrackerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
