// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for chainfetch integration tests
//!
//! Provides a scriptable [`ChainClient`] so orchestration and caching logic
//! can be tested without a real node. The mock holds a fixed "chain truth"
//! row set, answers `fetch_rows` by range/filter selection over it, and
//! records every call for assertions about fetch counts.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chainfetch::errors::ChainError;
use chainfetch::{BlockRange, ChainClient, FetchedRow, Filter, GridNode, StreamIdentity};
use serde_json::{json, Map};

/// Scriptable in-memory chain.
///
/// # Example
///
/// ```rust,ignore
/// let chain = MockChain::new(1_000_000)
///     .with_rows(transfer_rows(0..500))
///     .with_block_time(12);
/// chain.fail_range(BlockRange::new(100, 200)?); // always fails
/// ```
pub struct MockChain {
    rows: Vec<FetchedRow>,
    tip: u64,
    genesis_timestamp: u64,
    block_time: u64,
    span_limit: u64,
    calls: Mutex<Vec<BlockRange>>,
    header_calls: Mutex<Vec<u64>>,
    fail_ranges: Mutex<HashSet<BlockRange>>,
    transient_failures: Mutex<u32>,
}

impl MockChain {
    /// A chain with the given tip, no rows, and 12-second blocks.
    pub fn new(tip: u64) -> Self {
        Self {
            rows: Vec::new(),
            tip,
            genesis_timestamp: 1_600_000_000,
            block_time: 12,
            span_limit: 100_000,
            calls: Mutex::new(Vec::new()),
            header_calls: Mutex::new(Vec::new()),
            fail_ranges: Mutex::new(HashSet::new()),
            transient_failures: Mutex::new(0),
        }
    }

    /// Sets the chain truth served by `fetch_rows`.
    pub fn with_rows(mut self, rows: Vec<FetchedRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the per-request span limit reported to the orchestrator.
    pub fn with_span_limit(mut self, span_limit: u64) -> Self {
        self.span_limit = span_limit;
        self
    }

    /// Every `fetch_rows` call observed, in order.
    pub fn calls(&self) -> Vec<BlockRange> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `fetch_rows` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of `block_header` calls observed.
    pub fn header_call_count(&self) -> usize {
        self.header_calls.lock().unwrap().len()
    }

    /// Makes every `fetch_rows` call for exactly `range` fail as
    /// unavailable, until cleared.
    pub fn fail_range(&self, range: BlockRange) {
        self.fail_ranges.lock().unwrap().insert(range);
    }

    /// Clears all scripted range failures.
    pub fn clear_failures(&self) {
        self.fail_ranges.lock().unwrap().clear();
        *self.transient_failures.lock().unwrap() = 0;
    }

    /// Makes the next `count` `fetch_rows` calls fail with a rate limit.
    pub fn fail_next(&self, count: u32) {
        *self.transient_failures.lock().unwrap() = count;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn fetch_rows(
        &self,
        _identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        self.calls.lock().unwrap().push(range);

        {
            let mut remaining = self.transient_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChainError::RateLimited { retry_after: None });
            }
        }
        if self.fail_ranges.lock().unwrap().contains(&range) {
            return Err(ChainError::unavailable(
                format!("fetch_rows {range}"),
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "scripted failure"),
            ));
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| range.contains(row.block_number) && filter.matches(&row.fields))
            .cloned()
            .collect())
    }

    async fn block_header(&self, number: u64) -> Result<GridNode, ChainError> {
        if number > self.tip {
            return Err(ChainError::InvalidBlock {
                block_number: number,
                tip: self.tip,
            });
        }
        self.header_calls.lock().unwrap().push(number);
        Ok(GridNode {
            number,
            timestamp: self.genesis_timestamp + number * self.block_time,
        })
    }

    async fn chain_tip(&self) -> Result<u64, ChainError> {
        Ok(self.tip)
    }

    fn max_span(&self) -> u64 {
        self.span_limit
    }
}

/// One transfer-shaped log row.
pub fn transfer_row(block: u64, log_index: u64, from: &str, to: &str, value: u64) -> FetchedRow {
    let mut fields = Map::new();
    fields.insert("from".into(), json!(from));
    fields.insert("to".into(), json!(to));
    fields.insert("value".into(), json!(value.to_string()));
    FetchedRow {
        block_number: block,
        transaction_index: 0,
        log_index,
        fields,
    }
}
