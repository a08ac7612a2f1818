// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from the chain client boundary.

use std::time::Duration;

/// Errors raised by a [`ChainClient`](crate::chain::ChainClient)
/// implementation.
///
/// The orchestrator distinguishes transient failures (retried with backoff)
/// from caller errors (surfaced immediately); see
/// [`ChainError::is_transient`].
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The node or provider could not answer (network failure, timeout,
    /// provider downtime). Transient.
    #[error("chain unavailable during {operation}")]
    Unavailable {
        /// Description of the operation that failed (e.g. "get_logs 100-200")
        operation: String,
        /// The underlying transport/provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider rejected the request due to rate limiting. Transient;
    /// `retry_after` carries the provider's backoff hint when one was given.
    #[error("rate limited by provider")]
    RateLimited {
        /// Provider-supplied backoff hint, if any
        retry_after: Option<Duration>,
    },

    /// The requested block does not exist on the chain as reported by the
    /// provider. Caller error, never retried.
    #[error("block {block_number} is beyond the chain tip {tip}")]
    InvalidBlock {
        /// The requested block number
        block_number: u64,
        /// The chain tip reported by the provider
        tip: u64,
    },

    /// A response could not be decoded into rows. Not retried: the same
    /// response would fail again.
    #[error("failed to decode response for {operation}: {reason}")]
    Decode {
        /// Description of the operation whose response was malformed
        operation: String,
        /// What was wrong with the payload
        reason: String,
    },
}

impl ChainError {
    /// Helper to create an `Unavailable` error from any error type.
    pub fn unavailable(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ChainError::Unavailable {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Decode` error.
    pub fn decode(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        ChainError::Decode {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the orchestrator should retry this failure with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainError::Unavailable { .. } | ChainError::RateLimited { .. }
        )
    }

    /// The provider's backoff hint, if this is a rate-limit error carrying
    /// one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ChainError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
