pub mod cleaning;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod timeseries;
pub mod upload;
