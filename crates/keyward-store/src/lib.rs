//! # Keyward Store
//!
//! Storage abstraction for the Keyward protocol engine. Provides a
//! trait-based interface for protocol state with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store holds the protocol's durable state: registered clients,
//! request tokens, accepted nonces, authorization rules, and the
//! append-only decision log. The kernel is storage-agnostic behind the
//! [`Store`] trait; the primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ClientInsert`] / [`NonceInsert`] - Outcomes of the uniqueness-
//!   sensitive inserts
//!
//! ## Design Notes
//!
//! - **Atomic nonce recording**: [`Store::insert_nonce`] checks and
//!   records in one step, so a replayed request cannot slip through a
//!   race.
//! - **Atomic token takes**: [`Store::take_token`] removes and returns in
//!   one step, so concurrent exchanges produce exactly one winner.
//! - **Constraint-backed uniqueness**: duplicate client registrations are
//!   caught by the database, not by a pre-check.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ClientInsert, NonceInsert, Store};
