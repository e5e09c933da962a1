//! Row sanitizer: ordering, identifier removal and numeric coercion.

use serde_json::Value;
use tracing::debug;

use crate::cleaning::types::{RawRecord, SanitizedSession};
use crate::error::SchemaError;

pub const CONNECT_TIME: &str = "connectTime";
pub const START_CHARGE_TIME: &str = "startChargeTime";
pub const DEADLINE: &str = "Deadline";
pub const LAST_UPDATE: &str = "lastUpdate";
pub const CUM_ENERGY_WH: &str = "cumEnergy_Wh";
pub const PEAK_POWER_W: &str = "peakPower_W";

/// Fields identifying a user or payment; never carried past sanitizing.
pub static IDENTIFYING_FIELDS: &[&str] = &["user_email", "slrpPaymentId"];

/// Orders records by `connectTime`, drops identifying fields and coerces the
/// energy and power fields to `f64`.
///
/// The output has the same cardinality as the input.
///
/// The ordering compares `connectTime` as text, which is chronological only
/// while every record carries the same UTC offset (or none). Records with
/// differing offsets can come out of order; no later stage depends on it.
///
/// # Errors
///
/// Returns [`SchemaError`] if any record lacks a required field or carries a
/// non-numeric energy/power value.
pub fn sanitize(records: &[RawRecord]) -> Result<Vec<SanitizedSession>, SchemaError> {
    let mut sessions = records
        .iter()
        .enumerate()
        .map(|(row, record)| sanitize_record(row, record))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable, so records sharing a connect time keep their extract order.
    sessions.sort_by(|a, b| a.connect_time.cmp(&b.connect_time));

    debug!(records = sessions.len(), "Records sanitized");
    Ok(sessions)
}

fn sanitize_record(row: usize, record: &RawRecord) -> Result<SanitizedSession, SchemaError> {
    let mut extra = record.clone();
    for field in IDENTIFYING_FIELDS {
        extra.remove(*field);
    }

    let connect_time = take_text(row, &mut extra, CONNECT_TIME)?;
    let start_charge_time = take_text(row, &mut extra, START_CHARGE_TIME)?;
    let deadline = take_text(row, &mut extra, DEADLINE)?;
    let last_update = take_text(row, &mut extra, LAST_UPDATE)?;
    let cum_energy_wh = take_float(row, &mut extra, CUM_ENERGY_WH)?;
    let peak_power_w = take_float(row, &mut extra, PEAK_POWER_W)?;

    Ok(SanitizedSession {
        connect_time,
        start_charge_time,
        deadline,
        last_update,
        cum_energy_wh,
        peak_power_w,
        extra,
    })
}

fn take_required(
    row: usize,
    record: &mut RawRecord,
    field: &'static str,
) -> Result<Value, SchemaError> {
    match record.remove(field) {
        Some(Value::Null) | None => Err(SchemaError::MissingField { row, field }),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(SchemaError::MissingField { row, field })
        }
        Some(value) => Ok(value),
    }
}

fn take_text(row: usize, record: &mut RawRecord, field: &'static str) -> Result<String, SchemaError> {
    Ok(match take_required(row, record, field)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn take_float(row: usize, record: &mut RawRecord, field: &'static str) -> Result<f64, SchemaError> {
    let value = take_required(row, record, field)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| SchemaError::NotNumeric {
        row,
        field,
        value: value.to_string(),
    })
}
