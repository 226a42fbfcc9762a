//! Error types for signal generators.

use sl_core::CoreError;
use thiserror::Error;

/// Result type for generator operations.
pub type GenResult<T> = Result<T, GenError>;

/// Errors that can occur while configuring or reconstructing generators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenError {
    /// Out-of-domain construction or setter argument.
    #[error("Invalid parameter: {what}")]
    InvalidParam { what: &'static str },

    /// Serialized data is truncated or mistagged.
    #[error("Malformed serialized data: {0}")]
    Malformed(#[from] CoreError),
}

impl GenError {
    pub(crate) fn invalid(what: &'static str) -> Self {
        Self::InvalidParam { what }
    }
}
