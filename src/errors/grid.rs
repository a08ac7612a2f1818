// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from block-grid lookups.

use crate::errors::{ChainError, StoreError};

/// Errors raised by [`BlockGrid`](crate::grid::BlockGrid) operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The chain client could not answer.
    #[error("chain error during grid lookup")]
    Chain(#[from] ChainError),

    /// Grid node persistence failed.
    #[error("store error during grid lookup")]
    Store(#[from] StoreError),

    /// An inverse lookup targeted a timestamp past the chain tip, where no
    /// block exists yet.
    #[error("timestamp {timestamp} is after the chain tip (tip timestamp {tip_timestamp})")]
    TimestampBeyondTip {
        /// Requested UNIX timestamp
        timestamp: u64,
        /// Timestamp of the current tip block
        tip_timestamp: u64,
    },
}
