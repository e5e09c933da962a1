//! Demand time series.
//!
//! [`expand`] materializes sessions onto 5-minute slots and sums concurrent
//! demand, [`enrich`] adds energy and calendar columns, and [`aggregate_all`]
//! rolls the base series up into hourly, daily and monthly series.

pub mod aggregate;
pub mod expand;
pub mod features;
pub mod types;

pub use aggregate::{Aggregation, Column, DemandSeries, Granularity, aggregate_all, resample};
pub use expand::{SlotAlignment, expand};
pub use features::enrich;
pub use types::{BaseSample, EnrichedSample};
