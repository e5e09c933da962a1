//! Record types flowing through the cleaning stages.

use chrono::{NaiveDateTime, TimeDelta};
use serde_json::{Map, Value};

/// One charging session as delivered by the extract, field name to value.
pub type RawRecord = Map<String, Value>;

/// A raw record with identifying fields removed and numeric fields coerced.
///
/// Timestamp fields are still in their delivered text form; they are parsed
/// by the deriver.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedSession {
    pub connect_time: String,
    pub start_charge_time: String,
    pub deadline: String,
    pub last_update: String,
    pub cum_energy_wh: f64,
    pub peak_power_w: f64,
    /// Every other non-identifying field, kept verbatim.
    pub extra: Map<String, Value>,
}

/// A session that passed the quality filters, with its charge window resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSession {
    pub connect_time: NaiveDateTime,
    pub start_charge_time: NaiveDateTime,
    pub finish_charge_time: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub last_update: NaiveDateTime,
    pub cum_energy_wh: f64,
    pub peak_power_w: f64,
    /// Hours of charging implied by energy and power, in (0, 24).
    pub req_charge_time_h: f64,
    /// Time connected past the deadline, never negative.
    pub overstay: TimeDelta,
    pub overstay_h: f64,
    pub extra: Map<String, Value>,
}

/// Row counts for one derivation pass. Filtered rows are not reported
/// individually.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationAudit {
    pub input: usize,
    pub dropped_zero_power_or_energy: usize,
    pub dropped_charge_duration: usize,
    pub kept: usize,
}
