//! Error types for the kernel.
//!
//! The protocol's failure modes fall into a few families with very
//! different consumers: verification failures (reported to the calling
//! application with a reason), policy denials (reported with the
//! decision), token failures (deliberately opaque), and internal errors.

use thiserror::Error;

use keyward_policy::Decision;
use keyward_store::StoreError;

use crate::provider::KeyProviderError;

/// Why a signed request failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnverifiedReason {
    /// The presented client id is not registered.
    #[error("unknown client")]
    UnknownClient,

    /// The request timestamp is outside the freshness window.
    #[error("stale or future timestamp")]
    StaleTimestamp,

    /// The (client, nonce) pair has been seen before.
    #[error("replayed nonce")]
    ReplayedNonce,

    /// The signature does not match the canonical request.
    #[error("bad signature")]
    BadSignature,
}

/// Errors that can occur during kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The signed request failed authentication.
    #[error("request not verified: {0}")]
    Unverified(UnverifiedReason),

    /// A required request parameter is absent.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// A request parameter is present but unparseable.
    #[error("invalid parameter {name}: {value:?}")]
    InvalidParameter { name: String, value: String },

    /// The policy evaluator denied the requested access.
    #[error("access denied: {0:?}")]
    AccessDenied(Decision),

    /// The request token is missing, expired, unauthorized, or already
    /// exchanged. Deliberately carries no detail: a caller holding a bad
    /// token learns nothing about why it is bad.
    #[error("invalid request token")]
    InvalidRequestToken,

    /// A client already exists for the (subject, controller, application)
    /// triple.
    #[error("client registration failed: triple already registered")]
    RegistrationFailed,

    /// The key provider could not release a key.
    #[error("key provider error: {0}")]
    Provider(#[from] KeyProviderError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
