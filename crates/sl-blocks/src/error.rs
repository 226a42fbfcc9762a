//! Error types for SISO block operations.

use sl_core::CoreError;
use thiserror::Error;

/// Result type for SISO block operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors that can occur while configuring or reconstructing blocks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlockError {
    /// Out-of-domain construction or setter argument. Object state is left
    /// unchanged when this is returned from a setter.
    #[error("Invalid parameter: {what}")]
    InvalidParam { what: &'static str },

    /// Serialized data is truncated, mistagged or inconsistent with its own
    /// declared lengths.
    #[error("Malformed serialized data: {0}")]
    Malformed(#[from] CoreError),

    /// Container index outside the valid range.
    #[error("Index out of range: {index} (len={len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl BlockError {
    pub(crate) fn invalid(what: &'static str) -> Self {
        Self::InvalidParam { what }
    }
}
