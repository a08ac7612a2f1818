// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Sparse block-number-to-timestamp grid
//!
//! Mapping every block to its timestamp would cost one header fetch per
//! block. [`BlockGrid`] instead persists headers only at multiples of a
//! configured `step` and linearly interpolates between them, bounding the
//! error by one grid cell's block-time variance while keeping header fetches
//! at O(1) per cell. `step = 1` degenerates to exact timestamps.
//!
//! Nodes are write-once: chain history does not change, so a persisted node
//! is never refreshed.

use std::sync::Arc;

use alloy_primitives::BlockNumber;
use chrono::{DateTime, Utc};
use tracing::{debug, Instrument};

use crate::chain::ChainClient;
use crate::errors::{ChainError, GridError};
use crate::store::{CacheStore, StoreBatch};
use crate::tracing::spans;
use crate::types::GridNode;

/// Block-timestamp grid for one chain.
///
/// Shares its store with the coverage cache; grid nodes live in their own
/// keyspace keyed by chain id.
#[derive(Clone)]
pub struct BlockGrid {
    store: Arc<dyn CacheStore>,
    client: Arc<dyn ChainClient>,
    chain_id: u64,
    step: u64,
}

impl BlockGrid {
    /// Creates a grid with the given node spacing.
    ///
    /// # Panics
    ///
    /// Panics if `step` is zero.
    pub fn new(
        store: Arc<dyn CacheStore>,
        client: Arc<dyn ChainClient>,
        chain_id: u64,
        step: u64,
    ) -> Self {
        assert!(step > 0, "grid step must be positive");
        Self {
            store,
            client,
            chain_id,
            step,
        }
    }

    /// The configured node spacing.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Returns the grid node at or below `block` (the nearest multiple of
    /// the step, or block 0), fetching and persisting it on a store miss.
    /// Idempotent.
    pub async fn node_for(&self, block: BlockNumber) -> Result<GridNode, GridError> {
        self.node_at(block - block % self.step).await
    }

    /// The timestamp of `block`, exact for grid multiples and linearly
    /// interpolated between the surrounding nodes otherwise.
    ///
    /// Near the chain tip, where no node exists above `block`, the exact
    /// header is fetched instead of extrapolating.
    pub async fn timestamp_of(&self, block: BlockNumber) -> Result<DateTime<Utc>, GridError> {
        let span = spans::timestamp_of(self.chain_id, block);
        self.timestamp_of_inner(block).instrument(span).await
    }

    async fn timestamp_of_inner(&self, block: BlockNumber) -> Result<DateTime<Utc>, GridError> {
        let lower = block - block % self.step;
        if lower == block {
            return Ok(self.node_at(block).await?.datetime());
        }

        let below = self.node_at(lower).await?;
        let upper = lower + self.step;
        match self.node_at(upper).await {
            Ok(above) => {
                let weight = (block - lower) as f64 / (upper - lower) as f64;
                let seconds =
                    below.timestamp as f64 * (1.0 - weight) + above.timestamp as f64 * weight;
                let node = GridNode {
                    number: block,
                    timestamp: seconds.round() as u64,
                };
                Ok(node.datetime())
            }
            // The grid is truncated at the tip; use the exact header.
            Err(GridError::Chain(ChainError::InvalidBlock { .. })) => {
                Ok(self.client.block_header(block).await?.datetime())
            }
            Err(e) => Err(e),
        }
    }

    /// The approximate latest block at or before `at`, found by binary
    /// search over grid nodes (fetching nodes as needed) and interpolation
    /// within the final cell.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TimestampBeyondTip`] when `at` is later than the
    /// chain tip's timestamp.
    pub async fn block_at(&self, at: DateTime<Utc>) -> Result<BlockNumber, GridError> {
        let span = spans::block_at(self.chain_id, at);
        self.block_at_inner(at).instrument(span).await
    }

    async fn block_at_inner(&self, at: DateTime<Utc>) -> Result<BlockNumber, GridError> {
        let target = at.timestamp().max(0) as u64;

        let tip = self.client.chain_tip().await?;
        let tip_node = self.client.block_header(tip).await?;
        if target > tip_node.timestamp {
            return Err(GridError::TimestampBeyondTip {
                timestamp: target,
                tip_timestamp: tip_node.timestamp,
            });
        }

        let genesis = self.node_at(0).await?;
        if target <= genesis.timestamp {
            return Ok(0);
        }

        // Find the last grid cell whose node is at or before the target.
        // Invariant: cell `low` satisfies the bound, cells above `high` do
        // not; genesis established the base case.
        let mut low = 0u64;
        let mut high = tip / self.step;
        while low < high {
            let mid = (low + high).div_ceil(2);
            let node = self.node_at(mid * self.step).await?;
            if node.timestamp <= target {
                low = mid;
            } else {
                high = mid - 1;
            }
        }

        let below = self.node_at(low * self.step).await?;
        let above_number = ((low + 1) * self.step).min(tip);
        let above = if above_number == tip {
            tip_node
        } else {
            self.node_at(above_number).await?
        };

        if above.timestamp <= below.timestamp || above.number <= below.number {
            return Ok(below.number);
        }
        let weight =
            (target - below.timestamp) as f64 / (above.timestamp - below.timestamp) as f64;
        let estimated = below.number as f64 + weight * (above.number - below.number) as f64;
        Ok((estimated.round() as u64).min(tip))
    }

    /// Looks up a node in the store, fetching and persisting it on a miss.
    /// `number` must already be grid-aligned.
    async fn node_at(&self, number: BlockNumber) -> Result<GridNode, GridError> {
        if let Some(node) = self.store.grid_node(self.chain_id, number).await? {
            return Ok(node);
        }

        let node = self.client.block_header(number).await?;
        self.store
            .apply(StoreBatch {
                put_grid_nodes: vec![(self.chain_id, node)],
                ..Default::default()
            })
            .await?;
        debug!(
            chain_id = self.chain_id,
            number,
            timestamp = node.timestamp,
            "Persisted grid node"
        );
        Ok(node)
    }
}

impl std::fmt::Debug for BlockGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGrid")
            .field("chain_id", &self.chain_id)
            .field("step", &self.step)
            .finish()
    }
}
