//! Sample types for the materialized demand series.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Layout of the `time` index column in persisted artifacts.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Summed instantaneous demand of every session charging at `time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseSample {
    pub time: NaiveDateTime,
    pub avg_power_demand_w: f64,
}

/// One row of a demand series at any granularity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSample {
    #[serde(serialize_with = "serialize_time")]
    pub time: NaiveDateTime,
    #[serde(rename = "avg_power_demand_W")]
    pub avg_power_demand_w: f64,
    #[serde(rename = "energy_demand_kWh")]
    pub energy_demand_kwh: f64,
    #[serde(rename = "peak_power_W")]
    pub peak_power_w: f64,
    pub day: String,
    pub month: String,
}

fn serialize_time<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(TIME_FORMAT))
}
