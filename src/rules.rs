// 🏷️ Delivery Rules - per shipment type delivery windows
// Compares calendar days (midnight to midnight), never raw millisecond deltas

use crate::entities::ShipmentType;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};

/// Update type that suspends the overnight rule
pub const DELAYED_UPDATE: &str = "delayed";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// CALENDAR ZONE
// ============================================================================

/// Time zone in which instants are turned into calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// Process-local time zone
    #[default]
    Local,

    /// Fixed UTC offset (tests, servers running in a different zone than their users)
    Fixed(FixedOffset),
}

impl CalendarZone {
    pub fn utc() -> Self {
        CalendarZone::Fixed(Utc.fix())
    }

    /// Fixed zone from an offset in minutes east of UTC; None when out of range
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(CalendarZone::Fixed)
    }

    fn instant(millis: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Calendar date of an instant in this zone
    pub fn date_of(&self, millis: i64) -> Option<NaiveDate> {
        let instant = Self::instant(millis)?;
        Some(match self {
            CalendarZone::Local => instant.with_timezone(&Local).date_naive(),
            CalendarZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        })
    }

    /// Human-readable wall clock time of an instant in this zone
    pub fn format(&self, millis: i64) -> Option<String> {
        let instant = Self::instant(millis)?;
        Some(match self {
            CalendarZone::Local => instant.with_timezone(&Local).format(DATETIME_FORMAT).to_string(),
            CalendarZone::Fixed(offset) => {
                instant.with_timezone(offset).format(DATETIME_FORMAT).to_string()
            }
        })
    }

    /// Whole calendar days from `from` to `to` (negative when `to` is earlier)
    pub fn day_difference(&self, from: i64, to: i64) -> Option<i64> {
        let from = self.date_of(from)?;
        let to = self.date_of(to)?;
        Some(to.signed_duration_since(from).num_days())
    }
}

// ============================================================================
// RULE VALIDATOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator {
    zone: CalendarZone,
}

impl RuleValidator {
    pub fn new(zone: CalendarZone) -> Self {
        RuleValidator { zone }
    }

    pub fn zone(&self) -> CalendarZone {
        self.zone
    }

    /// Produce the violations for a candidate delivery time.
    ///
    /// At most one message is returned. Callers replace the shipment's
    /// violation list with the result; nothing is ever appended.
    pub fn validate(
        &self,
        shipment_type: ShipmentType,
        created_at: i64,
        candidate_delivery: i64,
        update_type: &str,
    ) -> Vec<String> {
        if shipment_type == ShipmentType::Standard {
            return Vec::new();
        }
        if shipment_type == ShipmentType::Overnight && update_type == DELAYED_UPDATE {
            return Vec::new();
        }

        let (days, created, delivery) = match (
            self.zone.day_difference(created_at, candidate_delivery),
            self.zone.format(created_at),
            self.zone.format(candidate_delivery),
        ) {
            (Some(days), Some(created), Some(delivery)) => (days, created, delivery),
            _ => {
                tracing::warn!(
                    created_at,
                    candidate_delivery,
                    "timestamps outside the calendar range, skipping delivery rules"
                );
                return Vec::new();
            }
        };

        let violation = match shipment_type {
            ShipmentType::Express if days > 3 => Some(format!(
                "Express shipment delivery date ({}) is more than 3 days after creation ({}).",
                delivery, created
            )),
            ShipmentType::Overnight if days != 1 => Some(format!(
                "Overnight shipment delivery date ({}) is not exactly 1 day after creation ({}).",
                delivery, created
            )),
            ShipmentType::Bulk if days < 3 => Some(format!(
                "Bulk shipment delivery date ({}) is sooner than 3 days after creation ({}).",
                delivery, created
            )),
            _ => None,
        };

        violation.into_iter().collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
