// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental fetch/cache engine for EVM chain data.
//!
//! chainfetch retrieves append-only, range-addressable records from an EVM
//! node (event logs, per-block call results, balances) and caches them so
//! that repeated or overlapping queries never re-fetch data already
//! retrieved. Three pieces cooperate:
//!
//! - [`BlockGrid`]: a sparse block-number-to-timestamp grid with linear
//!   interpolation, for cheap time/block conversions
//! - [`RangeFilterCache`]: subsumption-aware coverage bookkeeping; a range
//!   cached under a general filter answers any narrower query over the same
//!   blocks via local re-filtering
//! - [`FetchOrchestrator`]: computes coverage gaps, fetches them from the
//!   chain (batched, retried with backoff), and commits each gap atomically
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use alloy_chains::Chain;
//! use alloy_primitives::address;
//! use chainfetch::{
//!     BlockRange, ChainFetchConfig, DiskStore, FetchOrchestrator, Filter,
//!     RangeFilterCache, RpcChainClient, StreamIdentity,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChainFetchConfig::default();
//! let client = Arc::new(RpcChainClient::connect_http(
//!     "https://eth.example.com".parse()?,
//!     Chain::mainnet(),
//!     &config,
//! ));
//! let store = Arc::new(DiskStore::new("cache.json").validate()?);
//! let orchestrator =
//!     FetchOrchestrator::new(RangeFilterCache::new(store), client, config);
//!
//! let usdc = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
//! let transfers = StreamIdentity::logs(
//!     Chain::mainnet(),
//!     usdc,
//!     "event Transfer(address indexed from, address indexed to, uint256 value)",
//! );
//!
//! // First call fetches from the chain; identical or narrower calls over
//! // the same blocks are served from the cache.
//! let rows = orchestrator
//!     .fetch(&transfers, &Filter::empty(), BlockRange::new(19_000_000, 19_010_000)?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chain;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod grid;
pub mod store;
mod tracing;
pub mod types;

pub use cache::RangeFilterCache;
pub use chain::{ChainClient, RpcChainClient};
pub use config::{ChainFetchConfig, ChainFetchConfigBuilder};
pub use errors::ChainFetchError;
pub use fetch::FetchOrchestrator;
pub use grid::BlockGrid;
pub use store::{CacheStore, CoverageRecord, DiskStore, MemoryStore, StoreBatch};
pub use types::{
    BlockRange, FetchedRow, Filter, FilterValue, GridNode, StreamIdentity, StreamKind,
};
