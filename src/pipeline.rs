//! End-to-end materialization of a raw session extract.
//!
//! Each stage is a plain function over the previous stage's output:
//!
//! ```text
//! raw records -> sanitize -> derive -> expand -> enrich -> aggregate_all
//! ```

use tracing::info;

use crate::cleaning::{RawRecord, derive, sanitize};
use crate::error::PipelineResult;
use crate::stats::RunStats;
use crate::timeseries::{DemandSeries, Granularity, SlotAlignment, aggregate_all, enrich, expand};

/// Every series produced by one run, plus its statistics.
#[derive(Debug, Clone)]
pub struct DemandReport {
    /// Exactly one series per [`Granularity`], finest first.
    pub series: Vec<DemandSeries>,
    pub stats: RunStats,
}

impl DemandReport {
    pub fn get(&self, granularity: Granularity) -> Option<&DemandSeries> {
        self.series.iter().find(|s| s.granularity == granularity)
    }
}

/// Runs the full pipeline over one complete extract.
///
/// # Errors
///
/// Fails on the first schema or timestamp error; nothing is produced for a
/// failed run.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn run(records: &[RawRecord], alignment: SlotAlignment) -> PipelineResult<DemandReport> {
    let sanitized = sanitize(records)?;
    let (sessions, audit) = derive(sanitized)?;
    let base = enrich(&expand(&sessions, alignment));

    let stats = RunStats::from_run(&audit, &sessions, &base);
    let series = aggregate_all(base);

    info!(
        sessions = stats.sessions,
        base_slots = stats.base_slots,
        total_energy_kwh = stats.total_energy_kwh,
        max_demand_w = stats.max_demand_w,
        "Demand series materialized"
    );

    Ok(DemandReport { series, stats })
}
