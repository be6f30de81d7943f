//! Error types for Keyward core primitives.

use thiserror::Error;

/// Errors from signing, verification, and wire-form handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Signature did not match the recomputed MAC.
    #[error("invalid signature")]
    InvalidSignature,

    /// Candidate signature was not valid hex.
    #[error("malformed signature ({0} chars)")]
    MalformedSignature(usize),

    /// A wire form could not be parsed.
    #[error("invalid form: {0}")]
    InvalidForm(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
