// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Decoded chain records

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded chain record, tagged with its position on chain.
///
/// Rows sort by `(block_number, transaction_index, log_index)`, which is the
/// within-block ordering of event logs. Call and balance samples carry zero
/// transaction/log indices, so they order purely by block.
///
/// `fields` holds the decoded payload (event arguments, call return data,
/// balance value) as JSON; filters constrain these fields by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedRow {
    /// Block the record belongs to
    pub block_number: BlockNumber,
    /// Index of the containing transaction within the block
    #[serde(default)]
    pub transaction_index: u64,
    /// Index of the log within the block (zero for non-log rows)
    #[serde(default)]
    pub log_index: u64,
    /// Decoded payload fields
    pub fields: Map<String, Value>,
}

impl FetchedRow {
    /// A row positioned only by block, for per-block samples (calls,
    /// balances).
    pub fn at_block(block_number: BlockNumber, fields: Map<String, Value>) -> Self {
        Self {
            block_number,
            transaction_index: 0,
            log_index: 0,
            fields,
        }
    }

    /// The chain-order sort key. Unique per row within one stream.
    pub fn order_key(&self) -> (BlockNumber, u64, u64) {
        (self.block_number, self.transaction_index, self.log_index)
    }
}

impl PartialOrd for FetchedRow {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FetchedRow {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}
