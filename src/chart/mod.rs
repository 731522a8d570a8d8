//! Chart Data Transforms
//!
//! Server-side preparation of chart payloads: the spiderweb aggregate and
//! its flattened label/value series, plus the sector grid behind the
//! circular heatmap. Everything here is a pure function over a loaded
//! [`DataStore`](crate::model::DataStore) and a resolved team selection.

pub mod sector;
pub mod spiderweb;

pub use sector::{build_sectors, Sector};
pub use spiderweb::{build_aggregate, flatten, ChartSeries, SpiderwebAggregate, SubdimensionCount};

use thiserror::Error;

/// Errors from chart data transforms
#[derive(Error, Debug)]
pub enum ChartError {
    /// A leaf claims selected activities in an empty subdimension
    #[error(
        "malformed aggregate for '{subdimension}': {selected} selected out of {count} activities"
    )]
    MalformedAggregate {
        subdimension: String,
        selected: usize,
        count: usize,
    },
}

/// Result type for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
