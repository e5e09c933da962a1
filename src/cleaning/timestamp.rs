use chrono::{DateTime, NaiveDateTime};

use crate::error::DataQualityError;

/// Naive layouts accepted after the offset-aware forms have been tried.
static NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a session timestamp into a naive UTC wall-clock time.
///
/// Values carrying an offset are converted to UTC first; values without one
/// are taken as already being UTC.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, DataQualityError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.naive_utc());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| DataQualityError::UnparsableTimestamp {
            field,
            value: value.to_string(),
        })
}
