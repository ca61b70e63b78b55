/// Data layer: extraction, caching, and aggregation.
///
/// Architecture:
/// ```text
///  .pdf reports           .csv / .xlsx tables
///        │                        │
///        ▼                        │
///   ┌──────────┐                  │
///   │  pdf      │  page 1 → peak rows
///   └──────────┘                  │
///        │                        │
///        ▼                        │
///   ┌──────────┐                  │
///   │  cache    │  <path>.peaks.json
///   └──────────┘                  │
///        │                        ▼
///        ▼                  ┌──────────┐
///   ┌──────────┐            │ tabular   │  numeric columns, stacked
///   │ aggregate │  bin RT,  └──────────┘
///   └──────────┘  pivot           │
///        │                        │
///        └──────────┬─────────────┘
///                   ▼
///             ┌──────────┐
///             │  source   │  SourceKind dispatch → BatchOutcome
///             └──────────┘
///                   │
///                   ▼
///             ┌──────────┐
///             │  export   │  FeatureMatrix → .csv / .parquet
///             └──────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod export;
pub mod model;
pub mod pdf;
pub mod source;
pub mod tabular;
