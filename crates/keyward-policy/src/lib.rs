//! # Keyward Policy
//!
//! The authorization half of the Keyward protocol engine:
//!
//! - **Data types**: a fixed subsumption tree of personal-data categories
//! - **Vocabularies**: data uses, provenances, interaction purposes
//! - **Rules**: per-(subject, controller, data type) time-bounded
//!   allowances, with lock semantics
//! - **Defaults**: the built-in fallback table, matched via subsumption
//! - **Evaluator**: the pure decision function
//! - **Audit**: the event record every decision leaves behind

pub mod audit;
pub mod datatype;
pub mod defaults;
pub mod error;
pub mod evaluate;
pub mod rule;
pub mod terms;

pub use audit::AuthorizationEvent;
pub use datatype::DataType;
pub use defaults::{default_allows_provenance, default_allows_use};
pub use error::PolicyError;
pub use evaluate::{evaluate, AuthorizationProcess, Decision, Evaluation, RequestKind};
pub use rule::{AllowableAction, AllowableProvenance, AuthorizationRule};
pub use terms::{DataProvenance, DataUse, InteractionPurpose};
