//! Error types for pets-storage.
//!
//! [`StorageError`] covers failures of the storage engine itself: the
//! connection cannot be opened, SQLite rejects a statement, or the stored
//! schema version cannot be reconciled. [`GatewayError`] is what callers of
//! the record gateway see, wrapping address and storage failures.

use thiserror::Error;

use pets_core::{CoreError, ValidationFailure};

/// Errors produced by the storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A SQLite statement failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The backing database could not be opened.
    #[error("storage unavailable at {location}: {source}")]
    Unavailable {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Applying additive schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// The stored schema is newer than this build understands.
    #[error("cannot downgrade schema from version {found} to {expected}")]
    Downgrade { found: i64, expected: i64 },

    /// A stored row violates a record invariant.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}

/// Errors returned by the record gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The address could not be resolved.
    #[error(transparent)]
    Address(#[from] CoreError),

    /// The write carried an unrecoverable field value.
    #[error("validation failed: {0}")]
    Validation(ValidationFailure),

    /// The store rejected a new row.
    #[error("failed to insert a new row for {address}: {source}")]
    InsertFailed {
        address: String,
        #[source]
        source: StorageError,
    },

    /// The operation is not defined for this kind of address.
    #[error("{operation} is not supported for {address}")]
    Unsupported {
        operation: &'static str,
        address: String,
    },

    /// Any other storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
