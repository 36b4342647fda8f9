/// Data layer: core types, loading, selection filtering and table queries.
///
/// Architecture:
/// ```text
///   assets/iris.csv (bundled) / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + validate → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, categories in first-appearance order
///   └──────────┘
///        │                         │
///        ▼                         ▼
///   ┌──────────┐             ┌──────────┐
///   │  filter   │ Selection   │  table    │ sort / filter / page
///   └──────────┘             └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod table;
