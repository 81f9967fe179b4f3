/// Data layer: core types, loading, filtering, and persistence.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → PosterDataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ PosterDataset │  Vec<PosterRecord>, column order
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  normalize paths, gate scores, probe existence
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  filtered file (+ rejects log)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod probe;
pub mod writer;
