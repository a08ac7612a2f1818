// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Per-identity single-flight registry
//!
//! Concurrent fetches for the same stream identity must not issue duplicate
//! chain calls for the same gap. The registry hands out one async mutex per
//! identity cache key; gap computation and gap fetching happen under that
//! guard, and the second caller recomputes gaps after acquiring it, so work
//! the first caller committed is no longer a gap.
//!
//! Distinct identities get distinct locks and proceed fully in parallel.

use std::collections::HashMap;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::sync::Arc;

use tokio::sync::Mutex;

/// Registry of per-identity fetch locks.
///
/// Locks are created on first use and kept for the life of the registry;
/// the map is bounded by the number of distinct identities the process
/// touches.
#[derive(Debug, Default)]
pub(crate) struct FlightRegistry {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FlightRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The lock guarding gap work for `identity_key`. The caller holds the
    /// returned mutex (not the registry) while fetching.
    pub(crate) fn lock_for(&self, identity_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(identity_key.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_shares_a_lock() {
        let registry = FlightRegistry::new();
        let a = registry.lock_for("1:balance:0x00");
        let b = registry.lock_for("1:balance:0x00");
        assert!(Arc::ptr_eq(&a, &b));

        let _held = a.lock().await;
        assert!(b.try_lock().is_err());
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let registry = FlightRegistry::new();
        let a = registry.lock_for("1:balance:0x00");
        let b = registry.lock_for("1:balance:0x01");
        assert!(!Arc::ptr_eq(&a, &b));

        let _held = a.lock().await;
        assert!(b.try_lock().is_ok());
    }
}
