//! Error types for backend operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Storage refused the write, e.g. quota exhausted.
    #[error("storage quota exceeded for generation {generation}")]
    QuotaExceeded {
        /// Generation the write targeted.
        generation: String,
    },

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}
