// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from coverage bookkeeping and cache commits.

use crate::errors::StoreError;

/// Errors raised by [`RangeFilterCache`](crate::cache::RangeFilterCache)
/// operations.
///
/// `InvalidRange` and `InconsistentRange` are programmer errors: they are
/// surfaced immediately and never retried.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A malformed range was supplied (`start > end`).
    #[error("invalid block range: start {start} > end {end}")]
    InvalidRange {
        /// Requested start block
        start: u64,
        /// Requested end block
        end: u64,
    },

    /// A commit supplied rows outside the range it claims to cover. The
    /// commit is rejected wholesale; nothing is written.
    #[error("row at block {block} is outside the committed range [{start}, {end}]")]
    InconsistentRange {
        /// Offending row's block number
        block: u64,
        /// Committed range start
        start: u64,
        /// Committed range end
        end: u64,
    },

    /// The persistence store failed. The in-progress transaction is rolled
    /// back in full; previously committed entries are unaffected.
    #[error("cache store failure")]
    Store(#[from] StoreError),
}
