//! Error types raised by the cleaning and materialization stages.
//!
//! Row-level filtering never produces an error; only records that cannot be
//! read at all abort a run.

use thiserror::Error;

/// A required field is absent or cannot be coerced to its expected type.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("record {row}: required field '{field}' is missing")]
    MissingField { row: usize, field: &'static str },

    #[error("record {row}: field '{field}' is not numeric: {value}")]
    NotNumeric {
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// A timestamp field could not be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum DataQualityError {
    #[error("field '{field}' holds an unparsable timestamp: '{value}'")]
    UnparsableTimestamp { field: &'static str, value: String },
}

/// Fatal errors for a pipeline run.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("data quality error: {0}")]
    DataQuality(#[from] DataQualityError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
