//! # Keyward Testkit
//!
//! Testing utilities for the Keyward workspace:
//!
//! - [`fixtures`]: an in-memory escrow agent ([`TestAgent`]) with a
//!   deterministic key provider, and a client-side [`RequestSigner`] that
//!   builds valid signed bundles
//! - [`generators`]: proptest strategies over the policy vocabularies and
//!   protocol primitives

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    DerivedKeyProvider, FailingKeyProvider, RequestSigner, TestAgent, AUTHORIZE_URL,
    EXCHANGE_URL, TOKEN_URL,
};
