/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///   Indian_IPO_Market_Data.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse + coerce cells → IpoDataset (bad rows skipped)
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ IpoDataset │  Vec<IpoRecord>, year / company index
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  years + company query → filtered indices
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
