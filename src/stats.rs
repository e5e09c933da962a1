use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::cleaning::{DerivationAudit, DerivedSession};
use crate::timeseries::EnrichedSample;

/// Audit counters and headline figures for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub generated_at: DateTime<Utc>,

    // cleaning
    pub raw_records: usize,
    pub dropped_zero_power_or_energy: usize,
    pub dropped_charge_duration: usize,
    pub sessions: usize,

    // sessions
    pub mean_charge_time_h: f64,
    pub mean_overstay_h: f64,
    pub sessions_with_overstay: usize,

    // base series
    pub base_slots: usize,
    pub first_slot: Option<NaiveDateTime>,
    pub last_slot: Option<NaiveDateTime>,
    pub total_energy_kwh: f64,
    pub max_demand_w: f64,
}

impl RunStats {
    pub fn from_run(
        audit: &DerivationAudit,
        sessions: &[DerivedSession],
        base: &[EnrichedSample],
    ) -> Self {
        let mut s = RunStats {
            generated_at: Utc::now(),
            raw_records: audit.input,
            dropped_zero_power_or_energy: audit.dropped_zero_power_or_energy,
            dropped_charge_duration: audit.dropped_charge_duration,
            sessions: sessions.len(),
            base_slots: base.len(),
            first_slot: base.first().map(|r| r.time),
            last_slot: base.last().map(|r| r.time),
            ..Default::default()
        };

        if !sessions.is_empty() {
            let n = sessions.len() as f64;
            s.mean_charge_time_h = sessions.iter().map(|r| r.req_charge_time_h).sum::<f64>() / n;
            s.mean_overstay_h = sessions.iter().map(|r| r.overstay_h).sum::<f64>() / n;
            s.sessions_with_overstay = sessions.iter().filter(|r| r.overstay > TimeDelta::zero()).count();
        }

        for row in base {
            s.total_energy_kwh += row.energy_demand_kwh;
            s.max_demand_w = s.max_demand_w.max(row.avg_power_demand_w);
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of raw records that survived cleaning.
    pub fn kept_pct(&self) -> f64 {
        Self::pct(self.sessions, self.raw_records)
    }

    pub fn overstay_pct(&self) -> f64 {
        Self::pct(self.sessions_with_overstay, self.sessions)
    }
}
