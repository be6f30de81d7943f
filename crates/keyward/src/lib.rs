//! # Keyward
//!
//! The protocol engine of an escrow agent mediating access to encrypted
//! personal data. Controllers' applications authenticate with HMAC-signed
//! requests, obtain short-lived request tokens, have them authorized
//! against the data subject's policy, and exchange them for encryption
//! keys. Every authorization decision is appended to an audit log.
//!
//! ## Overview
//!
//! [`EscrowKernel`] is the facade: it composes the request validator, the
//! replay guard, the token lifecycle, the policy evaluator
//! (`keyward-policy`), storage (`keyward-store`), and the external
//! [`KeyProvider`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyward::{EscrowKernel, KernelConfig, KeyProvider};
//! use keyward_store::SqliteStore;
//!
//! async fn example(provider: Arc<dyn KeyProvider>) {
//!     let store = SqliteStore::open("keyward.db").unwrap();
//!     let kernel = EscrowKernel::new(store, provider, KernelConfig::default());
//!
//!     // let credentials = kernel.register_client(subject, controller, app).await?;
//!     // let token = kernel.issue_token(&signed_request).await?;
//! }
//! ```

pub mod bundle;
pub mod error;
pub mod kernel;
pub mod provider;
pub mod replay;
pub mod validator;

pub use bundle::SignedRequest;
pub use error::{KernelError, Result, UnverifiedReason};
pub use kernel::{EscrowKernel, KernelConfig};
pub use provider::{KeyProvider, KeyProviderError};
pub use replay::{ReplayGuard, DEFAULT_TIMESTAMP_TOLERANCE_MS};
