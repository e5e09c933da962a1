//! Loading an already-assembled raw session extract.
//!
//! The extract is a complete snapshot of the session store, either saved to
//! disk (`.csv`, `.json`, `.jsonl`/`.ndjson`) or published as a JSON array
//! at an `http(s)` URL.

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::cleaning::RawRecord;
use crate::fetch::{BasicClient, fetch_bytes};

/// Header of the positional index column written by dataframe CSV exports.
const INDEX_COLUMN_NAMES: &[&str] = &["", "Unnamed: 0"];

/// Loads every raw record from a file path or URL.
#[tracing::instrument]
pub async fn load_raw_records(source: &str) -> Result<Vec<RawRecord>> {
    let records = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new().context("building HTTP client")?;
        let bytes = fetch_bytes(&client, source).await?;
        debug!(bytes = bytes.len(), "Extract downloaded");
        parse_json_records(&bytes)?
    } else {
        let bytes = std::fs::read(source).with_context(|| format!("reading {source}"))?;
        parse_by_extension(Path::new(source), &bytes)?
    };

    info!(records = records.len(), "Raw extract loaded");
    Ok(records)
}

fn parse_by_extension(path: &Path, bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => parse_csv_records(bytes),
        "json" => parse_json_records(bytes),
        "jsonl" | "ndjson" => parse_json_lines(bytes),
        other => bail!("unsupported extract extension '{other}'; use .csv, .json or .jsonl"),
    }
}

/// Reads a CSV extract. Every cell becomes a string value; empty cells
/// become null.
pub fn parse_csv_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let headers = rdr.headers()?.clone();
    let skip_index = headers
        .get(0)
        .is_some_and(|first| INDEX_COLUMN_NAMES.contains(&first));

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .skip(usize::from(skip_index))
            .map(|(name, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (name.to_string(), value)
            })
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// Reads a JSON array of objects.
pub fn parse_json_records(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let items: Vec<Value> = serde_json::from_slice(bytes).context("parsing JSON extract")?;
    items.into_iter().enumerate().map(into_record).collect()
}

/// Reads one JSON object per line, skipping blank lines.
pub fn parse_json_lines(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let text = std::str::from_utf8(bytes).context("JSON lines extract is not UTF-8")?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            let value = serde_json::from_str(line)
                .with_context(|| format!("parsing JSON line {}", i + 1))?;
            into_record((i, value))
        })
        .collect()
}

fn into_record((i, value): (usize, Value)) -> Result<RawRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("extract item {i} is not an object: {other}")),
    }
}
