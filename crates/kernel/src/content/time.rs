//! Publishing window timestamps.
//!
//! Sunrise and sunset are entered as separate date and time fields in the
//! site's timezone and stored as UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::FormValues;

pub const SUNRISE_DATE: &str = "sunrise-date";
pub const SUNRISE_TIME: &str = "sunrise-time";
pub const SUNSET_DATE: &str = "sunset-date";
pub const SUNSET_TIME: &str = "sunset-time";

/// Errors turning form fields into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("{0} does not exist in the configured timezone")]
    Nonexistent(String),
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| TimeError::InvalidDate(raw.to_string()))
}

/// Parse an `HH:MM` or `HH:MM:SS` time.
pub fn parse_time(raw: &str) -> Result<NaiveTime, TimeError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| TimeError::InvalidTime(raw.to_string()))
}

/// Combine a date and time entered in `tz` into a UTC instant.
///
/// A blank date yields `None`. A blank time means midnight. Ambiguous local
/// times (DST fall-back) resolve to the earlier instant.
pub fn iso(date: Option<&str>, time: Option<&str>, tz: Tz) -> Result<Option<DateTime<Utc>>, TimeError> {
    let Some(date) = date.filter(|d| !d.trim().is_empty()) else {
        return Ok(None);
    };
    let date = parse_date(date)?;

    let time = match time.filter(|t| !t.trim().is_empty()) {
        Some(t) => parse_time(t)?,
        None => NaiveTime::MIN,
    };

    let local = NaiveDateTime::new(date, time);
    let resolved = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| TimeError::Nonexistent(local.to_string()))?;

    Ok(Some(resolved.with_timezone(&Utc)))
}

/// The raw sunrise/sunset fields of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishWindow {
    pub sunrise_date: Option<String>,
    pub sunrise_time: Option<String>,
    pub sunset_date: Option<String>,
    pub sunset_time: Option<String>,
}

impl PublishWindow {
    /// Pick the window fields out of submitted values.
    pub fn from_values(values: &FormValues) -> Self {
        let text = |key: &str| {
            values
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Self {
            sunrise_date: text(SUNRISE_DATE),
            sunrise_time: text(SUNRISE_TIME),
            sunset_date: text(SUNSET_DATE),
            sunset_time: text(SUNSET_TIME),
        }
    }

    /// Resolve sunrise in `tz`.
    pub fn sunrise(&self, tz: Tz) -> Result<Option<DateTime<Utc>>, TimeError> {
        iso(self.sunrise_date.as_deref(), self.sunrise_time.as_deref(), tz)
    }

    /// Resolve sunset in `tz`.
    pub fn sunset(&self, tz: Tz) -> Result<Option<DateTime<Utc>>, TimeError> {
        iso(self.sunset_date.as_deref(), self.sunset_time.as_deref(), tz)
    }
}
