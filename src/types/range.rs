// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Inclusive block-range value type
//!
//! [`BlockRange`] is the unit of cache coverage and gap computation. Both
//! endpoints are inclusive, so a range always covers at least one block.

use std::cmp::{max, min};
use std::fmt;

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

use crate::errors::CacheError;

/// An inclusive range of block numbers `[start, end]`.
///
/// Ranges are ordered by `start`, then `end`. Construction through
/// [`BlockRange::new`] validates `start <= end`; the unchecked literal form
/// is available to internal code that has already established the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block covered (inclusive)
    pub start: BlockNumber,
    /// Last block covered (inclusive)
    pub end: BlockNumber,
}

impl BlockRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidRange`] if `start > end`.
    pub fn new(start: BlockNumber, end: BlockNumber) -> Result<Self, CacheError> {
        if start > end {
            return Err(CacheError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of blocks covered (always >= 1).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether `block` falls inside this range.
    pub fn contains(&self, block: BlockNumber) -> bool {
        block >= self.start && block <= self.end
    }

    /// Whether this range shares at least one block with `other`.
    pub fn overlaps(&self, other: &BlockRange) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Whether this range ends exactly where `other` begins (or vice versa),
    /// with no block between them.
    pub fn adjacent_to(&self, other: &BlockRange) -> bool {
        // saturating: adjacency at u64::MAX / 0 boundaries degenerates to overlap
        self.end.saturating_add(1) == other.start || other.end.saturating_add(1) == self.start
    }

    /// Whether the two ranges can be coalesced into one contiguous range.
    pub fn mergeable_with(&self, other: &BlockRange) -> bool {
        self.overlaps(other) || self.adjacent_to(other)
    }

    /// The intersection of the two ranges, if any.
    pub fn intersect(&self, other: &BlockRange) -> Option<BlockRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(BlockRange {
            start: max(self.start, other.start),
            end: min(self.end, other.end),
        })
    }

    /// The smallest range covering both inputs. Only meaningful when
    /// [`mergeable_with`](Self::mergeable_with) holds; otherwise the result
    /// also covers the hole between them.
    pub fn merge(&self, other: &BlockRange) -> BlockRange {
        BlockRange {
            start: min(self.start, other.start),
            end: max(self.end, other.end),
        }
    }

    /// Subtracts a set of covered ranges from `self`, returning the ordered,
    /// non-overlapping leftovers (the gaps).
    ///
    /// `covered` may be unsorted and may overlap each other or extend past
    /// `self`; only the portion inside `self` matters.
    pub fn subtract_all(&self, covered: &[BlockRange]) -> Vec<BlockRange> {
        let mut spans: Vec<BlockRange> = covered
            .iter()
            .filter_map(|r| r.intersect(self))
            .collect();
        spans.sort_by_key(|r| r.start);

        let mut gaps = Vec::new();
        let mut cursor = self.start;
        for span in spans {
            if cursor < span.start {
                gaps.push(BlockRange {
                    start: cursor,
                    end: span.start - 1,
                });
            }
            cursor = max(cursor, span.end.saturating_add(1));
            if cursor > self.end {
                return gaps;
            }
        }
        if cursor <= self.end {
            gaps.push(BlockRange {
                start: cursor,
                end: self.end,
            });
        }
        gaps
    }

    /// Splits this range into consecutive chunks of at most `max_span`
    /// blocks, in ascending order.
    pub fn chunks(&self, max_span: u64) -> Vec<BlockRange> {
        assert!(max_span > 0, "max_span must be positive");
        let mut out = Vec::new();
        let mut start = self.start;
        while start <= self.end {
            let end = min(start.saturating_add(max_span - 1), self.end);
            out.push(BlockRange { start, end });
            if end == self.end {
                break;
            }
            start = end + 1;
        }
        out
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
