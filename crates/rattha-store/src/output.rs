//! JSON (and optionally Parquet) files written by the pipeline.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::StoreError;

/// Serialize `value` as pretty UTF-8 JSON and atomically replace `path` with it.
///
/// Thai text is written as-is, not `\u`-escaped. Parent directories are created.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let parent = output_dir(path)?;
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::json(path, e))?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Parent directory of `path`, created if absent.
fn output_dir(path: &Path) -> Result<&Path, StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    Ok(parent)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::SourceMissing(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| StoreError::json(path, e))
}

#[cfg(feature = "parquet")]
mod parquet_io {
    use std::path::Path;

    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use rattha_core::{SectionRecord, canonical};
    use tempfile::NamedTempFile;
    use tracing::info;

    use super::output_dir;
    use crate::StoreError;

    /// Write the canonical sequence as a single-batch Parquet file, replacing `path` atomically.
    pub fn write_parquet(path: &Path, records: &[SectionRecord]) -> Result<(), StoreError> {
        let parent = output_dir(path)?;
        let batch = canonical::to_record_batch(records)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        info!(path = %path.display(), rows = records.len(), "wrote parquet");
        Ok(())
    }

    pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
        let file = std::fs::File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches: Result<Vec<RecordBatch>, _> = reader.collect();
        Ok(batches?)
    }
}

#[cfg(feature = "parquet")]
pub use parquet_io::{read_parquet, write_parquet};
