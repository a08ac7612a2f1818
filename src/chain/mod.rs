// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Chain client boundary
//!
//! The fetch/cache engine consumes the chain through [`ChainClient`]: an
//! opaque, potentially failing, retryable source of rows and block headers.
//! Only the client interprets a [`StreamIdentity`](crate::StreamIdentity);
//! the cache layers never look inside one.
//!
//! [`RpcChainClient`] implements the trait over any Alloy provider. Tests
//! substitute mock implementations.

use alloy_primitives::BlockNumber;
use async_trait::async_trait;

use crate::errors::ChainError;
use crate::types::{BlockRange, FetchedRow, Filter, GridNode, StreamIdentity};

mod rpc;

pub use rpc::RpcChainClient;

/// Read access to an EVM node, scoped to what the fetch engine needs.
///
/// All methods may fail transiently ([`ChainError::is_transient`]); the
/// orchestrator handles retries, so implementations should not retry
/// internally.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetches the exhaustive set of rows matching `filter` for `identity`
    /// over `range` (inclusive), ordered by chain position.
    ///
    /// Completeness is load-bearing: the result is committed as cache
    /// coverage for exactly `(identity, filter, range)`.
    async fn fetch_rows(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError>;

    /// Fetches the header of `number` as a grid node.
    async fn block_header(&self, number: BlockNumber) -> Result<GridNode, ChainError>;

    /// The latest block number the node reports.
    async fn chain_tip(&self) -> Result<BlockNumber, ChainError>;

    /// Maximum block span the provider accepts per request; the orchestrator
    /// batches and splits gaps around this limit.
    fn max_span(&self) -> u64;
}
