// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from the persistence store boundary.

/// Errors raised by a [`CacheStore`](crate::store::CacheStore) backend.
///
/// All variants are terminal for the operation that hit them: a failed
/// [`apply`](crate::store::CacheStore::apply) leaves the store in its
/// previous consistent state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem I/O failed.
    #[error("store I/O failure at '{path}'")]
    Io {
        /// Path of the store file involved
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The store payload could not be (de)serialized.
    #[error("store serialization failure")]
    Serialization(#[from] serde_json::Error),

    /// The store file exists but its contents are not usable.
    #[error("store data at '{path}' is corrupt: {reason}")]
    Corrupt {
        /// Path of the offending store file
        path: String,
        /// What made the contents unusable
        reason: String,
    },
}

impl StoreError {
    /// Helper to create an `Io` error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
