//! Output formatting and persistence for demand series.
//!
//! Every artifact of a run is staged first and only renamed into place once
//! all of them were written, so a failure while staging leaves the previous
//! run's artifacts untouched. The renames themselves are not atomic as a
//! group: if one fails, artifacts renamed before it stay replaced and the
//! remaining staged files are removed.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::pipeline::DemandReport;
use crate::stats::RunStats;
use crate::timeseries::{DemandSeries, EnrichedSample};

/// File name of the JSON run summary written beside the CSV artifacts.
pub const SUMMARY_FILE: &str = "summary.json";

/// Logs run statistics as pretty-printed JSON.
pub fn print_json(stats: &RunStats) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Serializes a series as CSV to any writer, header included.
pub fn write_series<W: std::io::Write>(rows: &[EnrichedSample], writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Path of the CSV artifact for `series` under `dir`.
pub fn artifact_path(dir: &Path, series: &DemandSeries) -> PathBuf {
    dir.join(format!("{}.csv", series.granularity.name()))
}

/// Writes one CSV per granularity plus the JSON summary into `dir`.
///
/// Returns the final artifact paths. A staging error replaces nothing. A
/// rename error keeps the artifacts already moved into place and removes
/// the staged files that were not.
#[tracing::instrument(skip(dir, report), fields(dir = %dir.display()))]
pub fn write_report(dir: &Path, report: &DemandReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    if let Err(e) = stage_all(dir, report, &mut staged) {
        discard(&staged);
        return Err(e);
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (tmp, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, target) {
            discard(&staged[i..]);
            return Err(e).with_context(|| format!("moving {} into place", target.display()));
        }
        debug!(path = %target.display(), "Artifact persisted");
        written.push(target.clone());
    }

    info!(artifacts = written.len(), "Report persisted");
    Ok(written)
}

fn stage_all(
    dir: &Path,
    report: &DemandReport,
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<()> {
    for series in &report.series {
        let target = artifact_path(dir, series);
        let tmp = staged_path(&target);
        staged.push((tmp.clone(), target));

        let file = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        write_series(&series.rows, std::io::BufWriter::new(file))
            .with_context(|| format!("writing {}", tmp.display()))?;
    }

    let target = dir.join(SUMMARY_FILE);
    let tmp = staged_path(&target);
    staged.push((tmp.clone(), target));
    fs::write(&tmp, serde_json::to_vec_pretty(&report.stats)?)
        .with_context(|| format!("writing {}", tmp.display()))?;

    Ok(())
}

fn staged_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if tmp.exists() {
            if let Err(e) = fs::remove_file(tmp) {
                warn!(path = %tmp.display(), error = %e, "Failed to remove staged file");
            }
        }
    }
}
