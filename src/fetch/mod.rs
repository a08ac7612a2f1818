// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Gap-driven fetch orchestration
//!
//! [`FetchOrchestrator`] turns cache gaps into chain calls and keeps the
//! cache consistent under concurrent callers. A `fetch` call computes the
//! uncovered sub-ranges of the request, fetches them (batched within the
//! client's span limit, retried with backoff on transient failures), commits
//! each batch atomically as it completes, and finally reads the whole
//! request back from the cache so every caller sees a uniform view.
//!
//! Failures never leave a half-fetched gap behind: a batch is committed in
//! full or not at all, and a terminal error surfaces after earlier batches
//! have already landed. Retrying the same call later only re-fetches what is
//! still missing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn, Instrument};

use crate::cache::RangeFilterCache;
use crate::chain::ChainClient;
use crate::config::ChainFetchConfig;
use crate::errors::{ChainError, FetchError};
use crate::tracing::spans;
use crate::types::{BlockRange, FetchedRow, Filter, StreamIdentity};

mod singleflight;

use singleflight::FlightRegistry;

/// Orchestrates gap computation, chain fetching, and atomic commits for one
/// chain client and cache.
///
/// Cloning is cheap; clones share the cache, client, and single-flight
/// registry, so concurrent callers coordinate regardless of which clone they
/// hold.
#[derive(Clone)]
pub struct FetchOrchestrator {
    cache: RangeFilterCache,
    client: Arc<dyn ChainClient>,
    config: ChainFetchConfig,
    flights: Arc<FlightRegistry>,
}

impl FetchOrchestrator {
    /// Creates an orchestrator over `cache` and `client`.
    pub fn new(
        cache: RangeFilterCache,
        client: Arc<dyn ChainClient>,
        config: ChainFetchConfig,
    ) -> Self {
        Self {
            cache,
            client,
            config,
            flights: Arc::new(FlightRegistry::new()),
        }
    }

    /// The underlying coverage cache.
    pub fn cache(&self) -> &RangeFilterCache {
        &self.cache
    }

    /// Fetches all rows matching `(identity, filter)` in `range`, using the
    /// cache for everything already covered and the chain for the rest.
    ///
    /// Freshly fetched gaps are committed as they complete, so a failure
    /// partway through keeps the finished gaps: a later retry only
    /// re-fetches what is still missing. The returned rows are complete for
    /// the request, in chain order.
    ///
    /// Concurrent calls for the same identity serialize their gap work
    /// (single-flight); calls for distinct identities proceed in parallel.
    ///
    /// # Errors
    ///
    /// [`FetchError::RetriesExhausted`] when a gap keeps failing
    /// transiently; [`FetchError::Chain`] for non-transient chain errors,
    /// surfaced immediately without retry.
    pub async fn fetch(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, FetchError> {
        let key = identity.cache_key();
        let span = spans::fetch(&key, &filter.signature(), range);

        async move {
            // Fast path: a fully covered request never touches the lock.
            let gaps = self.cache.coverage_gaps(identity, filter, range).await?;
            if !gaps.is_empty() {
                let lock = self.flights.lock_for(&key);
                let _guard = lock.lock().await;

                // Recompute under the guard: a concurrent holder may have
                // committed some of our gaps while we waited.
                let gaps = self.cache.coverage_gaps(identity, filter, range).await?;
                debug!(gaps = gaps.len(), "Resolving coverage gaps");

                for batch in batch_gaps(&gaps, self.effective_span()) {
                    let rows = self
                        .fetch_batch(identity, filter, batch)
                        .instrument(spans::fetch_gap(&key, batch))
                        .await?;
                    self.cache.commit(identity, filter, batch, rows).await?;
                }
            }

            self.cache
                .read(identity, filter, range)
                .await
                .map_err(Into::into)
        }
        .instrument(span)
        .await
    }

    /// Fetches one batched gap, splitting it into span-sized chunks and
    /// retrying transient failures with exponential backoff. Chunk results
    /// are buffered and returned together so the caller commits the batch as
    /// one unit.
    ///
    /// The retry budget is shared across the batch's chunks.
    async fn fetch_batch(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        batch: BlockRange,
    ) -> Result<Vec<FetchedRow>, FetchError> {
        let max_failures = self.config.max_retries.saturating_add(1);
        let mut failures = 0u32;
        let mut rows = Vec::new();

        for chunk in batch.chunks(self.effective_span()) {
            loop {
                match self.call_chain(identity, filter, chunk).await {
                    Ok(chunk_rows) => {
                        rows.extend(chunk_rows);
                        break;
                    }
                    Err(err) if err.is_transient() => {
                        failures += 1;
                        if failures >= max_failures {
                            return Err(FetchError::RetriesExhausted {
                                attempts: failures,
                                gap: batch,
                                source: Box::new(err),
                            });
                        }
                        let delay = err
                            .retry_after()
                            .unwrap_or_else(|| backoff_delay(failures - 1, &self.config));
                        warn!(
                            %chunk,
                            attempt = failures,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Transient chain failure, backing off"
                        );
                        sleep(delay).await;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Ok(rows)
    }

    /// One chain call with the configured timeout; a timeout surfaces as a
    /// retryable failure.
    async fn call_chain(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        chunk: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        match timeout(
            self.config.call_timeout,
            self.client.fetch_rows(identity, filter, chunk),
        )
        .await
        {
            Ok(result) => result,
            Err(elapsed) => Err(ChainError::unavailable(
                format!("fetch_rows {chunk}"),
                elapsed,
            )),
        }
    }

    fn effective_span(&self) -> u64 {
        self.config.max_span.min(self.client.max_span()).max(1)
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("cache", &self.cache)
            .field("max_span", &self.config.max_span)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}

/// Greedily merges consecutive gaps into chain-call batches.
///
/// Two gaps join one batch when their union still fits in `max_span`; the
/// covered blocks between them are re-fetched, trading a little bandwidth
/// for one fewer round trip. The union is always exhaustively fetched, so
/// committing it as coverage stays sound.
fn batch_gaps(gaps: &[BlockRange], max_span: u64) -> Vec<BlockRange> {
    let mut batches: Vec<BlockRange> = Vec::new();
    for gap in gaps {
        match batches.last_mut() {
            Some(last) if last.merge(gap).len() <= max_span => *last = last.merge(gap),
            _ => batches.push(*gap),
        }
    }
    batches
}

/// Exponential backoff: `min(base * 2^attempt, max)`.
fn backoff_delay(attempt: u32, config: &ChainFetchConfig) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    config.base_delay.saturating_mul(factor).min(config.max_delay)
}
