//! Durable per-edition extraction progress.
//!
//! The checkpoint file is a JSON object keyed by batch number, each value being the raw
//! records extracted from that batch. Every successful batch rewrites the whole file
//! through a temp file and rename, so a crash leaves either the old or the new state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rattha_core::SectionRecord;
use tracing::{debug, info};

use crate::StoreError;
use crate::output::{read_json, write_json_atomic};

pub struct CheckpointStore {
    path: PathBuf,
    batches: BTreeMap<u32, Vec<SectionRecord>>,
}

impl CheckpointStore {
    /// Open the checkpoint at `path`, or start empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let batches: BTreeMap<u32, Vec<SectionRecord>> = if path.exists() {
            read_json(&path)?
        } else {
            BTreeMap::new()
        };
        info!(path = %path.display(), batches = batches.len(), "opened checkpoint");
        Ok(Self { path, batches })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, batch: u32) -> bool {
        self.batches.contains_key(&batch)
    }

    /// Record a completed batch and persist the checkpoint.
    ///
    /// If the write fails the batch is forgotten again, so memory never claims
    /// progress that is not on disk.
    pub fn record(&mut self, batch: u32, records: Vec<SectionRecord>) -> Result<(), StoreError> {
        let previous = self.batches.insert(batch, records);
        if let Err(e) = write_json_atomic(&self.path, &self.batches) {
            match previous {
                Some(old) => {
                    self.batches.insert(batch, old);
                }
                None => {
                    self.batches.remove(&batch);
                }
            }
            return Err(e);
        }
        debug!(batch, total = self.batches.len(), "checkpoint saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batch_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.batches.keys().copied()
    }

    /// All recorded records concatenated in ascending batch order.
    pub fn sequence(&self) -> Vec<SectionRecord> {
        self.batches.values().flatten().cloned().collect()
    }
}
