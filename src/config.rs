// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for chainfetch operations
//!
//! Controls the block-grid spacing, chain-call batching, per-block sampling,
//! and the retry policy applied to transient chain failures. Use
//! [`ChainFetchConfigBuilder`] for a fluent API.
//!
//! # Example
//!
//! ```rust
//! use chainfetch::ChainFetchConfig;
//! use std::time::Duration;
//!
//! // Defaults match common public RPC limits
//! let config = ChainFetchConfig::default();
//!
//! // Custom configuration
//! let config = ChainFetchConfig::builder()
//!     .block_grid_step(100)
//!     .max_span(2_000)
//!     .max_retries(5)
//!     .base_delay(Duration::from_millis(200))
//!     .build();
//! ```

use std::time::Duration;

/// Default spacing between retained block-grid nodes.
pub const DEFAULT_BLOCK_GRID_STEP: u64 = 1_000;
/// Default maximum blocks per chain call.
pub const DEFAULT_MAX_SPAN: u64 = 10_000;
/// Default spacing between per-block samples for call/balance streams.
pub const DEFAULT_SAMPLE_STEP: u64 = 1_000;
/// Default maximum retry attempts per gap (not counting the initial try).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
/// Default cap on the backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
/// Default timeout for an individual chain call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration injected into [`BlockGrid`](crate::grid::BlockGrid),
/// [`RpcChainClient`](crate::chain::RpcChainClient), and
/// [`FetchOrchestrator`](crate::fetch::FetchOrchestrator) at construction.
///
/// The core exposes no environment or CLI surface; applications build one of
/// these and pass it down.
#[derive(Debug, Clone)]
pub struct ChainFetchConfig {
    /// Spacing between retained block-grid nodes. `1` yields exact
    /// timestamps for every block at the cost of one header fetch each.
    pub block_grid_step: u64,

    /// Maximum number of blocks a single chain call may span. Gaps wider
    /// than this are split; adjacent gaps within it are batched.
    pub max_span: u64,

    /// Spacing between sampled blocks for call/balance streams.
    pub sample_step: u64,

    /// Maximum retry attempts per gap for transient chain failures.
    pub max_retries: u32,

    /// Base delay for exponential backoff
    /// (`min(base_delay * 2^attempt, max_delay)`).
    pub base_delay: Duration,

    /// Cap on the backoff delay.
    pub max_delay: Duration,

    /// Timeout around each individual chain call; a timeout surfaces as a
    /// retryable failure.
    pub call_timeout: Duration,
}

impl Default for ChainFetchConfig {
    fn default() -> Self {
        Self {
            block_grid_step: DEFAULT_BLOCK_GRID_STEP,
            max_span: DEFAULT_MAX_SPAN,
            sample_step: DEFAULT_SAMPLE_STEP,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ChainFetchConfig {
    /// Creates a builder seeded with the defaults.
    pub fn builder() -> ChainFetchConfigBuilder {
        ChainFetchConfigBuilder::default()
    }
}

/// Fluent builder for [`ChainFetchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChainFetchConfigBuilder {
    config: ChainFetchConfig,
}

impl ChainFetchConfigBuilder {
    /// Sets the block-grid node spacing. Must be positive.
    pub fn block_grid_step(mut self, step: u64) -> Self {
        assert!(step > 0, "block_grid_step must be positive");
        self.config.block_grid_step = step;
        self
    }

    /// Sets the maximum blocks per chain call. Must be positive.
    pub fn max_span(mut self, span: u64) -> Self {
        assert!(span > 0, "max_span must be positive");
        self.config.max_span = span;
        self
    }

    /// Sets the sample spacing for call/balance streams. Must be positive.
    pub fn sample_step(mut self, step: u64) -> Self {
        assert!(step > 0, "sample_step must be positive");
        self.config.sample_step = step;
        self
    }

    /// Sets the maximum retry attempts per gap.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Sets the base backoff delay.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Sets the backoff delay cap.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Sets the per-call timeout.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Builds the configured [`ChainFetchConfig`].
    pub fn build(self) -> ChainFetchConfig {
        self.config
    }
}
