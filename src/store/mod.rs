// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Persistence backends for cache coverage, rows, and grid nodes
//!
//! The core needs only three things from its store: point lookups by
//! identity and filter signature, range scans ordered by block number, and
//! atomic multi-record writes. [`CacheStore`] captures exactly that;
//! everything else (file formats, locking) is a backend concern.
//!
//! Two backends are provided:
//!
//! - [`DiskStore`]: versioned JSON file with advisory locking and atomic
//!   replace; a second process opening the same path sees committed data
//!   immediately
//! - [`MemoryStore`]: ephemeral, for tests and throwaway sessions
//!
//! All writes go through [`CacheStore::apply`], which applies a whole
//! [`StoreBatch`] or nothing. That is the transaction boundary the commit
//! path relies on.

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::types::{BlockRange, FetchedRow, Filter, GridNode};

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// One unit of cache coverage: for `identity`, blocks in `range` were
/// exhaustively fetched under `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Stream identity cache key
    pub identity: String,
    /// Filter the range was fetched under
    pub filter: Filter,
    /// Covered block range (inclusive)
    pub range: BlockRange,
}

/// A set of writes applied atomically by [`CacheStore::apply`].
///
/// Coverage removals run before insertions, so replacing a set of coalesced
/// records with their merged successor is a single batch.
#[derive(Debug, Clone, Default)]
pub struct StoreBatch {
    /// Coverage records to remove, matched by `(identity, signature, range)`
    pub remove_coverage: Vec<(String, String, BlockRange)>,
    /// Coverage records to insert
    pub put_coverage: Vec<CoverageRecord>,
    /// Rows to insert under `(identity, signature)`, deduplicated by chain
    /// order key against what is already stored
    pub put_rows: Vec<(String, String, Vec<FetchedRow>)>,
    /// Grid nodes to persist, keyed by chain id. Write-once: a node that
    /// already exists is left untouched.
    pub put_grid_nodes: Vec<(u64, GridNode)>,
}

impl StoreBatch {
    /// Whether the batch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.remove_coverage.is_empty()
            && self.put_coverage.is_empty()
            && self.put_rows.is_empty()
            && self.put_grid_nodes.is_empty()
    }
}

/// Transactional store for coverage records, materialized rows, and grid
/// nodes.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` and safe under concurrent access;
/// `apply` calls from different tasks may interleave but each batch lands
/// atomically.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// All coverage records for one identity, across every filter signature.
    async fn coverage_records(&self, identity: &str) -> Result<Vec<CoverageRecord>, StoreError>;

    /// Rows stored under `(identity, signature)` whose block number falls in
    /// `range`, ordered by `(block, transaction index, log index)`.
    async fn rows_in_range(
        &self,
        identity: &str,
        signature: &str,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, StoreError>;

    /// The grid node persisted for `(chain_id, number)`, if any.
    async fn grid_node(
        &self,
        chain_id: u64,
        number: BlockNumber,
    ) -> Result<Option<GridNode>, StoreError>;

    /// Applies a batch of writes atomically. On error nothing from the
    /// batch is visible.
    async fn apply(&self, batch: StoreBatch) -> Result<(), StoreError>;

    /// Human-readable backend name, for logging.
    fn name(&self) -> &'static str;
}

/// Current store format version.
pub(crate) const STORE_VERSION: u32 = 1;

/// In-memory image of the store contents. Shared by both backends; the disk
/// backend serializes it as versioned JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreData {
    /// Store format version
    pub version: u32,
    /// Flat coverage records (the original keeps these in an
    /// `events_indices` table)
    pub coverage: Vec<CoverageRecord>,
    /// identity -> filter signature -> rows sorted by chain order
    pub rows: HashMap<String, HashMap<String, Vec<FetchedRow>>>,
    /// chain id -> block number -> header timestamp
    pub grid: HashMap<u64, BTreeMap<BlockNumber, u64>>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            coverage: Vec::new(),
            rows: HashMap::new(),
            grid: HashMap::new(),
        }
    }
}

impl StoreData {
    /// Applies a batch in memory. Infallible by construction; backends
    /// surface their own I/O errors around this.
    pub fn apply(&mut self, batch: StoreBatch) {
        for (identity, signature, range) in &batch.remove_coverage {
            self.coverage.retain(|record| {
                !(record.identity == *identity
                    && record.filter.signature() == *signature
                    && record.range == *range)
            });
        }
        for record in batch.put_coverage {
            self.coverage.push(record);
        }
        for (identity, signature, rows) in batch.put_rows {
            let slot = self
                .rows
                .entry(identity)
                .or_default()
                .entry(signature)
                .or_default();
            slot.extend(rows);
            slot.sort();
            slot.dedup_by_key(|row| row.order_key());
        }
        for (chain_id, node) in batch.put_grid_nodes {
            // Grid nodes are write-once
            self.grid
                .entry(chain_id)
                .or_default()
                .entry(node.number)
                .or_insert(node.timestamp);
        }
    }

    pub fn coverage_for(&self, identity: &str) -> Vec<CoverageRecord> {
        self.coverage
            .iter()
            .filter(|record| record.identity == identity)
            .cloned()
            .collect()
    }

    pub fn rows_for(&self, identity: &str, signature: &str, range: BlockRange) -> Vec<FetchedRow> {
        self.rows
            .get(identity)
            .and_then(|by_sig| by_sig.get(signature))
            .map(|rows| {
                rows.iter()
                    .filter(|row| range.contains(row.block_number))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn grid_node_for(&self, chain_id: u64, number: BlockNumber) -> Option<GridNode> {
        self.grid
            .get(&chain_id)
            .and_then(|nodes| nodes.get(&number))
            .map(|&timestamp| GridNode { number, timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn row(block: u64, log: u64) -> FetchedRow {
        FetchedRow {
            block_number: block,
            transaction_index: 0,
            log_index: log,
            fields: Map::new(),
        }
    }

    #[test]
    fn test_apply_inserts_rows_sorted_and_deduplicated() {
        let mut data = StoreData::default();
        data.apply(StoreBatch {
            put_rows: vec![("id".into(), "{}".into(), vec![row(5, 1), row(3, 0)])],
            ..Default::default()
        });
        data.apply(StoreBatch {
            put_rows: vec![("id".into(), "{}".into(), vec![row(4, 0), row(5, 1)])],
            ..Default::default()
        });

        let rows = data.rows_for("id", "{}", BlockRange::new(0, 100).unwrap());
        let keys: Vec<_> = rows.iter().map(FetchedRow::order_key).collect();
        assert_eq!(keys, vec![(3, 0, 0), (4, 0, 0), (5, 0, 1)]);
    }

    #[test]
    fn test_grid_nodes_are_write_once() {
        let mut data = StoreData::default();
        data.apply(StoreBatch {
            put_grid_nodes: vec![(
                1,
                GridNode {
                    number: 1000,
                    timestamp: 111,
                },
            )],
            ..Default::default()
        });
        // A conflicting re-write is ignored, not an overwrite
        data.apply(StoreBatch {
            put_grid_nodes: vec![(
                1,
                GridNode {
                    number: 1000,
                    timestamp: 999,
                },
            )],
            ..Default::default()
        });
        assert_eq!(data.grid_node_for(1, 1000).unwrap().timestamp, 111);
    }

    #[test]
    fn test_remove_coverage_matches_exactly() {
        let mut data = StoreData::default();
        let filter = Filter::empty();
        let record = |start, end| CoverageRecord {
            identity: "id".into(),
            filter: filter.clone(),
            range: BlockRange::new(start, end).unwrap(),
        };
        data.apply(StoreBatch {
            put_coverage: vec![record(0, 10), record(20, 30)],
            ..Default::default()
        });
        data.apply(StoreBatch {
            remove_coverage: vec![(
                "id".into(),
                filter.signature(),
                BlockRange::new(0, 10).unwrap(),
            )],
            put_coverage: vec![record(0, 30)],
            ..Default::default()
        });

        let coverage = data.coverage_for("id");
        assert_eq!(coverage.len(), 2);
        assert!(coverage.iter().any(|r| r.range.start == 0 && r.range.end == 30));
        assert!(coverage.iter().any(|r| r.range.start == 20 && r.range.end == 30));
    }
}
