use crate::timeseries::types::{BaseSample, EnrichedSample};

/// Base slots per hour.
pub const SLOTS_PER_HOUR: f64 = 12.0;

/// Adds energy, peak power and calendar labels to each base sample.
///
/// At base granularity the peak equals the slot's demand.
pub fn enrich(series: &[BaseSample]) -> Vec<EnrichedSample> {
    series
        .iter()
        .map(|sample| EnrichedSample {
            time: sample.time,
            avg_power_demand_w: sample.avg_power_demand_w,
            energy_demand_kwh: sample.avg_power_demand_w / 1000.0 / SLOTS_PER_HOUR,
            peak_power_w: sample.avg_power_demand_w,
            day: sample.time.format("%A").to_string(),
            month: sample.time.format("%B").to_string(),
        })
        .collect()
}
