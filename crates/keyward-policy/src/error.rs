//! Error types for the policy module.

use thiserror::Error;

/// Errors from parsing policy vocabulary names.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("unknown data use: {0}")]
    UnknownDataUse(String),

    #[error("unknown data provenance: {0}")]
    UnknownProvenance(String),

    #[error("unknown interaction purpose: {0}")]
    UnknownPurpose(String),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
