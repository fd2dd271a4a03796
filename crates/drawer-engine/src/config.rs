//! # Engine Configuration
//!
//! The business date that scopes "one open session per register and period"
//! is the calendar date at the pharmacy, not in UTC. A session opened at
//! 23:30 local on the 1st belongs to the 1st even when UTC says the 2nd.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use drawer_core::ValidationError;

/// Largest UTC offset in use anywhere (UTC+14:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Settings the engine needs from the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub business_offset: FixedOffset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            business_offset: Utc.fix(),
        }
    }
}

impl EngineConfig {
    /// Builds a config from a UTC offset in minutes (`-300` for UTC-05:00).
    ///
    /// ## Example
    /// ```rust
    /// use drawer_engine::EngineConfig;
    ///
    /// let lima = EngineConfig::from_offset_minutes(-300).unwrap();
    /// assert_eq!(lima.offset_minutes(), -300);
    /// assert!(EngineConfig::from_offset_minutes(15 * 60).is_err());
    /// ```
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -(MAX_UTC_OFFSET_MINUTES as i64),
                max: MAX_UTC_OFFSET_MINUTES as i64,
            });
        }

        let business_offset =
            FixedOffset::east_opt(minutes * 60).ok_or_else(|| ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -(MAX_UTC_OFFSET_MINUTES as i64),
                max: MAX_UTC_OFFSET_MINUTES as i64,
            })?;

        Ok(EngineConfig { business_offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.business_offset.local_minus_utc() / 60
    }

    /// The business date an instant falls on.
    pub fn business_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.business_offset).date_naive()
    }
}
