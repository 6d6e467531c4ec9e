// 📨 Update Parser
// One delimited text record → one immutable ShipmentUpdate
//
// Record format: updateType,shipmentId,timestampMillis[,remainder]
// Only the first three commas are structural. Everything after the third
// field is one opaque payload and is never split again.

use crate::error::{Result, TrackingError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SHIPMENT UPDATE
// ============================================================================

/// ShipmentUpdate - one parsed instruction to mutate a shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentUpdate {
    /// Tag selecting the strategy ("created", "shipped", ...)
    pub update_type: String,

    pub shipment_id: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Payload whose meaning depends on `update_type`
    pub other_info: Vec<String>,
}

impl ShipmentUpdate {
    pub fn new(update_type: &str, shipment_id: &str, timestamp: i64) -> Self {
        ShipmentUpdate {
            update_type: update_type.to_string(),
            shipment_id: shipment_id.to_string(),
            timestamp,
            other_info: Vec::new(),
        }
    }

    /// Builder pattern: attach the payload
    pub fn with_info(mut self, info: &str) -> Self {
        self.other_info.push(info.to_string());
        self
    }

    /// First payload element, if any
    pub fn info(&self) -> Option<&str> {
        self.other_info.first().map(String::as_str)
    }

    /// Parse one record line
    pub fn parse(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.splitn(4, ',').collect();

        if parts.len() < 3 {
            return Err(TrackingError::MalformedUpdate {
                line: line.to_string(),
            });
        }

        let update_type = parts[0].trim();
        let shipment_id = parts[1].trim();
        let raw_timestamp = parts[2].trim();

        let timestamp = raw_timestamp
            .parse::<i64>()
            .map_err(|_| TrackingError::InvalidTimestamp {
                value: raw_timestamp.to_string(),
            })?;

        let other_info = match parts.get(3) {
            Some(remainder) => vec![remainder.trim().to_string()],
            None => Vec::new(),
        };

        Ok(ShipmentUpdate {
            update_type: update_type.to_string(),
            shipment_id: shipment_id.to_string(),
            timestamp,
            other_info,
        })
    }

    /// Serialize back into the record format accepted by `parse`
    pub fn to_record(&self) -> String {
        let mut record = format!("{},{},{}", self.update_type, self.shipment_id, self.timestamp);
        if !self.other_info.is_empty() {
            record.push(',');
            record.push_str(&self.other_info.join(","));
        }
        record
    }
}

impl fmt::Display for ShipmentUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_record())
    }
}

/// Parse one record line
pub fn parse(line: &str) -> Result<ShipmentUpdate> {
    ShipmentUpdate::parse(line)
}

// ============================================================================
// TESTS
// ============================================================================
