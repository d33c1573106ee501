/// Data layer: core types, cleaning, loading, filtering and statistics.
///
/// Architecture:
/// ```text
///   raw .csv
///      │
///      ▼
///   ┌──────────┐
///   │  clean   │  validate, dedupe, derive bands → Vec<CleanedEvent>
///   └──────────┘
///      │
///      ▼
///   ┌──────────┐
///   │  writer  │  .csv / .json / .parquet
///   └──────────┘
///      │
///      ▼
///   ┌──────────┐
///   │  loader  │  parse file once → Arc<Dataset>
///   └──────────┘
///      │
///      ▼
///   ┌──────────┐
///   │  filter  │  FilterConfig → View (row indices)
///   └──────────┘
///      │
///      ▼
///   ┌─────────────────────┐
///   │ stats / aggregate   │  Summary, correlations, breakdowns
///   └─────────────────────┘
/// ```

pub mod aggregate;
pub mod category;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;
