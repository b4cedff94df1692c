/// Data layer: core types, loading, filtering and writing.
///
/// Architecture:
/// ```text
///  NN_hit04.par(.gz) / .csv / .parquet        atmos.txt.gz
///        │                                         │
///        ▼                                         ▼
///   ┌──────────┐                            ┌──────────┐
///   │  loader   │  parse → LineTable         │  loader   │  → ReferenceSpectrum
///   └──────────┘                            └──────────┘
///        │                                         │ grid
///        ▼                                         ▼
///   ┌──────────────────────────────────────────────────┐
///   │  filter   coverage ranges → local max → abridge   │
///   └──────────────────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  hitran_abridged_<NAME>.txt.gz
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
