// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for chainfetch operations.
//!
//! Telemetry is kept orthogonal to business logic: instead of `#[instrument]`
//! attributes on functions, each instrumented operation has a corresponding
//! span helper here, attached with `tracing::Instrument` at the call site.

use alloy_primitives::BlockNumber;
use chrono::{DateTime, Utc};
use tracing::Span;

use crate::types::BlockRange;

/// Create span for a full fetch call: gap computation, chain calls, commits,
/// and the final cache read.
///
/// Parent: None (root span for this operation)
/// Children: fetch_gap spans (one per batched gap)
#[inline]
pub(crate) fn fetch(identity: &str, filter: &str, range: BlockRange) -> Span {
    tracing::info_span!(
        "chainfetch.fetch",
        identity = identity,
        filter = filter,
        start_block = range.start,
        end_block = range.end,
        block_count = range.len(),
    )
}

/// Create span for fetching and committing one batched gap.
///
/// Parent: fetch span
/// Children: chain client calls (one per chunk, plus retries)
#[inline]
pub(crate) fn fetch_gap(identity: &str, gap: BlockRange) -> Span {
    tracing::debug_span!(
        "chainfetch.fetch_gap",
        identity = identity,
        start_block = gap.start,
        end_block = gap.end,
        block_count = gap.len(),
    )
}

/// Create span for a block timestamp lookup, exact or interpolated.
///
/// Parent: caller's span, if any
/// Children: RPC calls for grid node headers
#[inline]
pub(crate) fn timestamp_of(chain_id: u64, block_number: BlockNumber) -> Span {
    tracing::debug_span!(
        "chainfetch.timestamp_of",
        chain_id = chain_id,
        block_number = block_number,
    )
}

/// Create span for an inverse block-at-timestamp lookup.
///
/// Parent: None (root span for this operation)
/// Children: RPC calls for grid node headers (during binary search)
#[inline]
pub(crate) fn block_at(chain_id: u64, at: DateTime<Utc>) -> Span {
    tracing::info_span!(
        "chainfetch.block_at",
        chain_id = chain_id,
        target_ts = at.timestamp(),
    )
}
