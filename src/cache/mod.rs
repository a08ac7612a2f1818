// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Subsumption-aware range coverage cache
//!
//! [`RangeFilterCache`] tracks, per stream identity, which block ranges have
//! already been fetched and under which filter. A stored range fetched under
//! a general filter also answers any more specific query over the same
//! blocks: the cached rows are a superset, and the query filter is re-applied
//! locally. The cache therefore never re-fetches a block for a filter it can
//! already prove covered.
//!
//! Three operations make up the public surface:
//!
//! - [`coverage_gaps`](RangeFilterCache::coverage_gaps): which sub-ranges of
//!   a request are *not* yet covered
//! - [`read`](RangeFilterCache::read): the cached rows for the covered part
//!   of a request, filtered locally
//! - [`commit`](RangeFilterCache::commit): record a freshly fetched range,
//!   coalescing with adjacent same-filter coverage in one atomic batch

use std::sync::Arc;

use tracing::debug;

use crate::errors::CacheError;
use crate::store::{CacheStore, CoverageRecord, StoreBatch};
use crate::types::{BlockRange, FetchedRow, Filter, StreamIdentity};

/// Coverage cache over an arbitrary [`CacheStore`] backend.
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct RangeFilterCache {
    store: Arc<dyn CacheStore>,
}

impl RangeFilterCache {
    /// Creates a cache over `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// The backing store, shared with other components.
    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    /// Computes the sub-ranges of `range` not covered for `(identity,
    /// filter)`.
    ///
    /// A stored record covers a block for `filter` when its own filter is at
    /// least as general ([`Filter::subsumes`]). Coverage from *different*
    /// qualifying filters combines: a request half-covered by an exact-match
    /// record and half by an empty-filter record has no gap across the seam.
    ///
    /// The result is ordered, non-overlapping, and empty when the request is
    /// fully covered.
    pub async fn coverage_gaps(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<BlockRange>, CacheError> {
        let covering: Vec<BlockRange> = self
            .qualifying_records(identity, filter)
            .await?
            .into_iter()
            .map(|record| record.range)
            .collect();

        let gaps = range.subtract_all(&covering);
        debug!(
            identity = %identity.cache_key(),
            %filter,
            %range,
            gaps = gaps.len(),
            "Computed coverage gaps"
        );
        Ok(gaps)
    }

    /// Reads the cached rows matching `(identity, filter)` within `range`.
    ///
    /// Only covered blocks contribute rows; uncovered sub-ranges are silently
    /// skipped (call [`coverage_gaps`](Self::coverage_gaps) first, or go
    /// through the orchestrator, for a complete answer). Each covered block
    /// is served by exactly one qualifying record, preferring the most
    /// specific one, and `filter` is re-applied to every row so that rows
    /// stored under a more general filter never leak through.
    ///
    /// Rows come back in chain order with no duplicates.
    pub async fn read(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, CacheError> {
        let mut records = self.qualifying_records(identity, filter).await?;
        sort_by_specificity(&mut records);

        let key = identity.cache_key();
        let mut rows = Vec::new();
        // Sub-ranges still waiting for a serving record. Each record claims
        // its intersection with these, so every block is read exactly once.
        let mut unserved = vec![range];

        for record in &records {
            if unserved.is_empty() {
                break;
            }
            let signature = record.filter.signature();
            let mut remaining = Vec::new();
            for piece in unserved {
                match piece.intersect(&record.range) {
                    Some(served) => {
                        let stored = self.store.rows_in_range(&key, &signature, served).await?;
                        rows.extend(stored.into_iter().filter(|row| filter.matches(&row.fields)));
                        remaining.extend(piece.subtract_all(&[served]));
                    }
                    None => remaining.push(piece),
                }
            }
            unserved = remaining;
        }

        rows.sort();
        debug!(
            identity = %key,
            %filter,
            %range,
            rows = rows.len(),
            "Read cached rows"
        );
        Ok(rows)
    }

    /// Records that `range` was exhaustively fetched for `(identity,
    /// filter)`, storing `rows` alongside the coverage.
    ///
    /// Adjacent or overlapping coverage records with the *same* filter are
    /// coalesced into one contiguous record; coverage under other filters is
    /// left untouched. The removals, the merged record, and the rows land in
    /// a single atomic store batch, so a crash mid-commit never yields
    /// coverage without its rows.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InconsistentRange`] if any row's block number
    /// falls outside `range`; nothing is written in that case.
    pub async fn commit(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
        rows: Vec<FetchedRow>,
    ) -> Result<(), CacheError> {
        for row in &rows {
            if !range.contains(row.block_number) {
                return Err(CacheError::InconsistentRange {
                    block: row.block_number,
                    start: range.start,
                    end: range.end,
                });
            }
        }

        let key = identity.cache_key();
        let signature = filter.signature();

        let mut same_filter: Vec<BlockRange> = self
            .store
            .coverage_records(&key)
            .await?
            .into_iter()
            .filter(|record| record.filter.signature() == signature)
            .map(|record| record.range)
            .collect();

        // Merging can chain: a record adjacent only through another absorbed
        // record still belongs in the merged run, so sweep until stable.
        let mut merged = range;
        let mut absorbed = Vec::new();
        let mut grew = true;
        while grew {
            grew = false;
            same_filter.retain(|candidate| {
                if merged.mergeable_with(candidate) {
                    merged = merged.merge(candidate);
                    absorbed.push(*candidate);
                    grew = true;
                    false
                } else {
                    true
                }
            });
        }

        let batch = StoreBatch {
            remove_coverage: absorbed
                .iter()
                .map(|r| (key.clone(), signature.clone(), *r))
                .collect(),
            put_coverage: vec![CoverageRecord {
                identity: key.clone(),
                filter: filter.clone(),
                range: merged,
            }],
            put_rows: vec![(key.clone(), signature, rows)],
            put_grid_nodes: Vec::new(),
        };

        self.store.apply(batch).await?;
        debug!(
            identity = %key,
            %filter,
            committed = %range,
            stored = %merged,
            coalesced = absorbed.len(),
            "Committed coverage"
        );
        Ok(())
    }

    /// All coverage records for `identity` whose filter qualifies to serve
    /// `filter` (is at least as general).
    async fn qualifying_records(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
    ) -> Result<Vec<CoverageRecord>, CacheError> {
        Ok(self
            .store
            .coverage_records(&identity.cache_key())
            .await?
            .into_iter()
            .filter(|record| record.filter.subsumes(filter))
            .collect())
    }
}

impl std::fmt::Debug for RangeFilterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeFilterCache")
            .field("store", &self.store.name())
            .finish()
    }
}

/// Orders records most-specific-first: more constrained filters win, then
/// narrower ranges, then filter signature for determinism.
fn sort_by_specificity(records: &mut [CoverageRecord]) {
    records.sort_by(|a, b| {
        b.filter
            .constraint_count()
            .cmp(&a.filter.constraint_count())
            .then_with(|| a.range.len().cmp(&b.range.len()))
            .then_with(|| a.filter.signature().cmp(&b.filter.signature()))
    });
}
