// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the chainfetch library.
//!
//! This module follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`ChainError`],
//!   [`CacheError`], [`StoreError`], [`GridError`], [`FetchError`])
//! - **Unified error type** ([`ChainFetchError`]) for callers that don't
//!   need to distinguish error sources
//!
//! The split mirrors the propagation policy: [`ChainError`] variants marked
//! transient are retried by the orchestrator with exponential backoff;
//! [`CacheError::InvalidRange`] and [`CacheError::InconsistentRange`] are
//! programmer errors surfaced immediately; [`StoreError`] aborts the
//! in-progress commit and leaves previously committed entries untouched.

mod cache;
mod chain;
mod fetch;
mod grid;
mod store;

pub use cache::CacheError;
pub use chain::ChainError;
pub use fetch::FetchError;
pub use grid::GridError;
pub use store::StoreError;

/// Unified error type for all chainfetch operations.
///
/// All module-specific error types convert into `ChainFetchError` via `From`
/// implementations, so `?` propagates them naturally in application code.
#[derive(Debug, thiserror::Error)]
pub enum ChainFetchError {
    /// Error from the chain client boundary.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Error from coverage bookkeeping or commits.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the persistence store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from block-grid lookups.
    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    /// Error from fetch orchestration.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}
