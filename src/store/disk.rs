// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Disk-backed store with file locking and versioning

use std::fs::File;
use std::path::PathBuf;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CacheStore, CoverageRecord, StoreBatch, StoreData, STORE_VERSION};
use crate::errors::StoreError;
use crate::types::{BlockRange, FetchedRow, GridNode};

/// Disk-backed [`CacheStore`] persisting to a single versioned JSON file.
///
/// Writes go to a temp file which is atomically renamed over the store path,
/// so readers never observe a half-written file and a failed `apply` leaves
/// the previous contents intact. Advisory file locks (shared for reads,
/// exclusive for writes) make the file safe to share between processes: a
/// second process opening the same path sees committed batches immediately.
///
/// The cache is append-and-merge only, so the file grows monotonically with
/// fetched history. There is no eviction; chain history does not change.
///
/// # Examples
///
/// ```rust,ignore
/// use chainfetch::store::DiskStore;
///
/// let store = DiskStore::new("cache.json").validate()?;
/// ```
#[derive(Debug)]
pub struct DiskStore {
    path: PathBuf,
    // Serializes load-modify-save cycles within this process; cross-process
    // safety comes from the file locks.
    write_guard: Mutex<()>,
}

impl DiskStore {
    /// Creates a disk store at `path`.
    ///
    /// The path is not touched until the first I/O operation; use
    /// [`validate`](Self::validate) to check it eagerly.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    /// Validates the store path, creating the parent directory if needed and
    /// checking that it is writable.
    pub fn validate(self) -> Result<Self, StoreError> {
        let parent = self.path.parent().ok_or_else(|| {
            StoreError::io(
                self.path.display().to_string(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "store path has no parent directory",
                ),
            )
        })?;

        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(parent.display().to_string(), e))?;
            debug!(path = %parent.display(), "Created store directory");
        }

        let probe = parent.join(".store_write_test");
        std::fs::write(&probe, b"probe")
            .map_err(|e| StoreError::io(parent.display().to_string(), e))?;
        let _ = std::fs::remove_file(&probe);

        debug!(path = %self.path.display(), "Store path validated");
        Ok(self)
    }

    /// Loads store contents with a shared lock. A missing file is an empty
    /// store.
    fn load(&self) -> Result<StoreData, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Store file does not exist, starting empty");
            return Ok(StoreData::default());
        }

        let path_str = self.path.display().to_string();
        let file = File::open(&self.path).map_err(|e| StoreError::io(path_str.clone(), e))?;
        file.lock_shared()
            .map_err(|e| StoreError::io(path_str.clone(), e))?;

        let data: StoreData = serde_json::from_reader(&file).map_err(|e| {
            warn!(path = %path_str, error = %e, "Failed to parse store file");
            StoreError::Corrupt {
                path: path_str.clone(),
                reason: e.to_string(),
            }
        })?;
        drop(file);

        if data.version != STORE_VERSION {
            return Err(StoreError::Corrupt {
                path: path_str,
                reason: format!(
                    "unsupported store version {} (expected {})",
                    data.version, STORE_VERSION
                ),
            });
        }

        Ok(data)
    }

    /// Saves store contents via temp file + atomic rename, holding an
    /// exclusive lock for the rename.
    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let json = serde_json::to_vec(data)?;
        let temp_path = self.path.with_extension("tmp");
        let temp_str = temp_path.display().to_string();

        std::fs::write(&temp_path, &json).map_err(|e| StoreError::io(temp_str.clone(), e))?;

        let file = File::open(&temp_path).map_err(|e| StoreError::io(temp_str.clone(), e))?;
        file.lock().map_err(|e| StoreError::io(temp_str, e))?;

        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError::io(self.path.display().to_string(), e))?;
        drop(file);

        debug!(
            path = %self.path.display(),
            coverage = data.coverage.len(),
            "Saved store"
        );
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn coverage_records(&self, identity: &str) -> Result<Vec<CoverageRecord>, StoreError> {
        Ok(self.load()?.coverage_for(identity))
    }

    async fn rows_in_range(
        &self,
        identity: &str,
        signature: &str,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, StoreError> {
        Ok(self.load()?.rows_for(identity, signature, range))
    }

    async fn grid_node(
        &self,
        chain_id: u64,
        number: BlockNumber,
    ) -> Result<Option<GridNode>, StoreError> {
        Ok(self.load()?.grid_node_for(chain_id, number))
    }

    async fn apply(&self, batch: StoreBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let _guard = self.write_guard.lock().await;
        let mut data = self.load()?;
        data.apply(batch);
        self.save(&data)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DiskStore"
    }
}
