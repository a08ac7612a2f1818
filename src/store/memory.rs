// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory store (no persistence)

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStore, CoverageRecord, StoreBatch, StoreData};
use crate::errors::StoreError;
use crate::types::{BlockRange, FetchedRow, GridNode};

/// In-memory [`CacheStore`].
///
/// Nothing survives the process; use [`DiskStore`](super::DiskStore) when a
/// second process must see committed data. Primarily for tests and
/// throwaway analysis sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn coverage_records(&self, identity: &str) -> Result<Vec<CoverageRecord>, StoreError> {
        Ok(self.data.read().await.coverage_for(identity))
    }

    async fn rows_in_range(
        &self,
        identity: &str,
        signature: &str,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, StoreError> {
        Ok(self.data.read().await.rows_for(identity, signature, range))
    }

    async fn grid_node(
        &self,
        chain_id: u64,
        number: BlockNumber,
    ) -> Result<Option<GridNode>, StoreError> {
        Ok(self.data.read().await.grid_node_for(chain_id, number))
    }

    async fn apply(&self, batch: StoreBatch) -> Result<(), StoreError> {
        self.data.write().await.apply(batch);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "MemoryStore"
    }
}
