//! Core error types for pets-core.
//!
//! Uses `thiserror` for structured, matchable variants: address resolution
//! failures in [`CoreError`] and the single unrecoverable validation outcome
//! in [`ValidationFailure`].

use thiserror::Error;

use crate::contract::codes;

/// Errors produced while resolving logical addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The address matches neither the collection nor the item pattern.
    #[error("unknown address: '{address}'")]
    UnknownAddress { address: String },

    /// An item address carried an identifier that does not fit a row id.
    #[error("invalid record id segment: '{segment}'")]
    InvalidId { segment: String },
}

/// Unrecoverable validation outcome. Aborts the whole write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The name field was present but blank after trimming.
    #[error("pet name must not be empty")]
    InvalidName,
}

impl ValidationFailure {
    /// Legacy numeric code for this failure.
    pub fn code(self) -> i32 {
        match self {
            ValidationFailure::InvalidName => codes::NOT_VALID_NAME,
        }
    }
}
