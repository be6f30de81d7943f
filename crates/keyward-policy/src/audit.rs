//! Audit events: the append-only record of authorization decisions.
//!
//! Every decision the evaluator produces is captured as an
//! [`AuthorizationEvent`] and appended to the store. Events are never
//! updated or deleted.

use serde::{Deserialize, Serialize};

use keyward_core::{ApplicationId, ControllerId, SubjectId, UnixMillis};

use crate::datatype::DataType;
use crate::evaluate::{AuthorizationProcess, Decision, RequestKind};

/// One recorded authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationEvent {
    /// Whose data the request was about.
    pub subject: SubjectId,

    /// Who asked.
    pub controller: ControllerId,

    /// Which application presented the request.
    pub application: ApplicationId,

    /// The data category in question.
    pub data_type: DataType,

    /// The requested access, including use or provenance.
    pub request: RequestKind,

    /// The outcome.
    pub decision: Decision,

    /// Whether defaults or the subject's own rules decided.
    pub process: AuthorizationProcess,

    /// When the decision was made (Unix ms).
    pub timestamp: UnixMillis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::{DataUse, InteractionPurpose};

    #[test]
    fn test_event_serde_roundtrip() {
        let event = AuthorizationEvent {
            subject: SubjectId::new("alice"),
            controller: ControllerId::new("shop"),
            application: ApplicationId::new("app"),
            data_type: DataType::PersonalEmail,
            request: RequestKind::Decryption {
                data_use: DataUse::ComposeEmailToSubject,
                purpose: InteractionPurpose::Contractual,
            },
            decision: Decision::Allowed,
            process: AuthorizationProcess::DataSubjectRules,
            timestamp: 1_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AuthorizationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
