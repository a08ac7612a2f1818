// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Block grid nodes

use alloy_primitives::BlockNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted `(block number, timestamp)` pair at a fixed grid spacing.
///
/// Grid nodes are write-once: re-fetching an existing node is a no-op. The
/// timestamp is the block header's UNIX timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridNode {
    /// Block number (a multiple of the grid step, or block 0, or the tip
    /// when the grid is truncated there)
    pub number: BlockNumber,
    /// Header timestamp, UNIX seconds
    pub timestamp: u64,
}

impl GridNode {
    /// The node's timestamp as a UTC datetime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.timestamp as i64, 0)
            .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC)
    }
}
