//! Storage layer: extraction checkpoints, legacy reference loading, page discovery, and
//! pipeline output files (JSON, optionally Parquet).

mod checkpoint;
mod error;
mod legacy;
mod output;
mod pages;

pub use checkpoint::CheckpointStore;
pub use error::StoreError;
pub use legacy::load_legacy_map;
#[cfg(feature = "parquet")]
pub use output::{read_parquet, write_parquet};
pub use output::{read_json, write_json_atomic};
pub use pages::{PageBatch, batches, discover_editions, discover_pages};
