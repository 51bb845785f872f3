/// Data layer: decoding, validation, aggregation, chart alignment.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  decode file → Vec<DecodedRow>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌─────────┐
///   │ validate │ ───▶ │  parse  │  DecodedRow → RawRow
///   └──────────┘      └─────────┘
///                          │
///                          ▼
///                   ┌───────────┐
///                   │ aggregate │  Vec<Experiment> + summaries
///                   └───────────┘
///                          │  (per chart render)
///                          ▼
///            ┌───────┐   ┌────────┐   ┌────────┐
///            │ align │ ─▶│ sample │ ─▶│ export │
///            └───────┘   └────────┘   └────────┘
/// ```

pub mod aggregate;
pub mod align;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod parse;
pub mod sample;
pub mod validate;
