//! The authorization policy evaluator.
//!
//! Decides whether a (subject, controller, data type, intended use) tuple
//! is currently permitted. The evaluator itself is a pure function over an
//! optionally present rule; fetching the rule and recording the audit
//! event are the caller's side of the contract.

use serde::{Deserialize, Serialize};

use keyward_core::UnixMillis;

use crate::datatype::DataType;
use crate::defaults::{default_allows_provenance, default_allows_use};
use crate::rule::AuthorizationRule;
use crate::terms::{DataProvenance, DataUse, InteractionPurpose};

/// What kind of data access the request describes.
///
/// One tagged union instead of per-request bundle classes: the evaluator
/// pattern-matches, so a request can never arrive with the wrong bundle
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Encrypt data for storage. `update` distinguishes overwriting an
    /// existing field (provenance-checked) from first-time storage.
    Encryption {
        provenance: DataProvenance,
        update: bool,
    },
    /// Decrypt data for a stated use and purpose.
    Decryption {
        data_use: DataUse,
        purpose: InteractionPurpose,
    },
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allowed,
    DeniedByDataSubject,
    DeniedByDefault,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Which rule set produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationProcess {
    /// The built-in default table decided.
    Default,
    /// The subject's explicit rule decided.
    DataSubjectRules,
}

/// A decision together with how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: Decision,
    pub process: AuthorizationProcess,
}

/// Evaluate a request against the subject's rule for the exact data type,
/// falling back to the default table when no rule exists.
///
/// The fallback is deliberately shallow: an existing rule is authoritative
/// for its data type, even when it matches nothing (that is a denial by
/// the subject, not a reason to consult defaults). Only a wholly absent
/// rule reaches the default table, which is where subsumption applies.
///
/// First-time encryption (`update == false`) is always allowed: storing
/// new data about a subject is the controller's entry point into escrow,
/// and the subject's rules govern everything that happens afterwards.
pub fn evaluate(
    rule: Option<&AuthorizationRule>,
    data_type: DataType,
    kind: RequestKind,
    now: UnixMillis,
) -> Evaluation {
    if let RequestKind::Encryption { update: false, .. } = kind {
        return Evaluation {
            decision: Decision::Allowed,
            process: AuthorizationProcess::Default,
        };
    }

    match rule {
        Some(rule) => {
            debug_assert_eq!(rule.data_type, data_type);
            let allowed = match kind {
                RequestKind::Decryption { data_use, .. } => rule.allows_use(data_use, now),
                RequestKind::Encryption { provenance, .. } => {
                    rule.allows_provenance(provenance, now)
                }
            };
            Evaluation {
                decision: if allowed {
                    Decision::Allowed
                } else {
                    Decision::DeniedByDataSubject
                },
                process: AuthorizationProcess::DataSubjectRules,
            }
        }
        None => {
            let allowed = match kind {
                RequestKind::Decryption { data_use, .. } => {
                    default_allows_use(data_type, data_use)
                }
                RequestKind::Encryption { provenance, .. } => {
                    default_allows_provenance(data_type, provenance)
                }
            };
            Evaluation {
                decision: if allowed {
                    Decision::Allowed
                } else {
                    Decision::DeniedByDefault
                },
                process: AuthorizationProcess::Default,
            }
        }
    }
}
