// ⚠️ Tracking Errors
// Every failure the update pipeline can report, funneled into one enum

use thiserror::Error;

/// Result alias for the update pipeline
pub type Result<T> = std::result::Result<T, TrackingError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// Record has fewer than the three leading fields
    #[error("Invalid update line format (missing type, ID, or timestamp): {line}")]
    MalformedUpdate { line: String },

    /// Timestamp field is not a base-10 integer
    #[error("Invalid timestamp '{value}': expected milliseconds since epoch")]
    InvalidTimestamp { value: String },

    /// Type tag on a "created" record is not one of the known shipment types
    #[error("Invalid shipment type string: {0}. Must be STANDARD, EXPRESS, OVERNIGHT, or BULK.")]
    UnknownShipmentType(String),

    #[error("Shipment {0} not found")]
    ShipmentNotFound(String),

    #[error("Unknown update type '{0}'")]
    UnknownUpdateType(String),

    /// Delivery timestamp payload could not be parsed (recoverable)
    #[error("Invalid delivery timestamp for shipment {shipment_id}: {value}")]
    InvalidPayload { shipment_id: String, value: String },
}

impl TrackingError {
    /// Errors that leave the shipment partially updated instead of rejecting the record
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrackingError::InvalidPayload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_carries_tag_verbatim() {
        let err = TrackingError::UnknownShipmentType("Priority".to_string());
        assert!(err.to_string().contains("Priority"));
    }

    #[test]
    fn test_only_payload_errors_are_recoverable() {
        let payload = TrackingError::InvalidPayload {
            shipment_id: "S1".to_string(),
            value: "soon".to_string(),
        };
        assert!(payload.is_recoverable());
        assert!(!TrackingError::ShipmentNotFound("S1".to_string()).is_recoverable());
        assert!(!TrackingError::UnknownUpdateType("teleported".to_string()).is_recoverable());
    }
}
