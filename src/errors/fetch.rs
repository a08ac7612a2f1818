// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from fetch orchestration.

use crate::errors::{CacheError, ChainError};
use crate::types::BlockRange;

/// Errors raised by
/// [`FetchOrchestrator::fetch`](crate::fetch::FetchOrchestrator::fetch).
///
/// A failed fetch never leaves partially committed gaps behind: gaps that
/// completed before the failure are committed and visible, the failing gap
/// and everything after it are not.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A chain call failed with a non-transient error.
    #[error("chain error during fetch")]
    Chain(#[from] ChainError),

    /// Coverage bookkeeping or the commit path failed.
    #[error("cache error during fetch")]
    Cache(#[from] CacheError),

    /// A transient chain failure persisted through every retry attempt for
    /// one gap.
    #[error("retries exhausted after {attempts} attempts fetching gap {gap}")]
    RetriesExhausted {
        /// Total attempts made (initial try plus retries)
        attempts: u32,
        /// The gap that could not be fetched
        gap: BlockRange,
        /// The last transient error observed
        #[source]
        source: Box<ChainError>,
    },
}
