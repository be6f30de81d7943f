//! The built-in default-rule table.
//!
//! Consulted only when no explicit rule exists for the exact data type.
//! Entries are keyed by data-type node and matched through the subsumption
//! relation, independent of any subject or controller: an entry for
//! `Identity` covers `GivenName`, `Surname`, and every other descendant.
//!
//! Nothing under `Sensitive` appears here, so sensitive data is denied by
//! default absent an explicit rule.

use crate::datatype::DataType;
use crate::terms::{DataProvenance, DataUse};

/// Default permitted uses, per data-type subtree.
const DEFAULT_USES: &[(DataType, DataUse)] = &[
    (DataType::Identity, DataUse::ComposeEmailToSubject),
    (DataType::Identity, DataUse::ComposeLetterToSubject),
    (DataType::HomeContact, DataUse::ComposeEmailToSubject),
    (DataType::HomeContact, DataUse::ComposeLetterToSubject),
    (DataType::HomeContact, DataUse::SendSmsToSubject),
    (DataType::WorkContact, DataUse::ComposeEmailToSubject),
    (DataType::WorkContact, DataUse::ComposeLetterToSubject),
    (DataType::Nonpersonal, DataUse::Report),
    (DataType::Nonpersonal, DataUse::Analytics),
];

/// Default permitted provenances, per data-type subtree.
const DEFAULT_PROVENANCES: &[(DataType, DataProvenance)] = &[
    (DataType::Personal, DataProvenance::DataSubjectExplicit),
    (DataType::Personal, DataProvenance::DataController),
    (DataType::Nonpersonal, DataProvenance::PublicData),
    (DataType::Nonpersonal, DataProvenance::PublicRegistry),
];

/// True iff the default table permits `data_use` for `data_type` or one of
/// its ancestors.
pub fn default_allows_use(data_type: DataType, data_use: DataUse) -> bool {
    DEFAULT_USES
        .iter()
        .any(|&(node, u)| u == data_use && data_type.is_a(node))
}

/// True iff the default table permits `provenance` for `data_type` or one
/// of its ancestors.
pub fn default_allows_provenance(data_type: DataType, provenance: DataProvenance) -> bool {
    DEFAULT_PROVENANCES
        .iter()
        .any(|&(node, p)| p == provenance && data_type.is_a(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_email_allowed_by_default() {
        assert!(default_allows_use(
            DataType::Identity,
            DataUse::ComposeEmailToSubject
        ));
    }

    #[test]
    fn test_descendant_matches_through_subsumption() {
        // GIVEN_NAME is-a IDENTITY; the IDENTITY entry covers it.
        assert!(default_allows_use(
            DataType::GivenName,
            DataUse::ComposeEmailToSubject
        ));
    }

    #[test]
    fn test_sensitive_denied_by_default() {
        for &u in DataUse::ALL {
            assert!(!default_allows_use(DataType::Health, u));
        }
        for &p in DataProvenance::ALL {
            assert!(!default_allows_provenance(DataType::Health, p));
        }
    }

    #[test]
    fn test_unlisted_use_denied() {
        assert!(!default_allows_use(DataType::Identity, DataUse::PublishWorld));
    }

    #[test]
    fn test_personal_provenance_defaults() {
        assert!(default_allows_provenance(
            DataType::PersonalEmail,
            DataProvenance::DataSubjectExplicit
        ));
        assert!(!default_allows_provenance(
            DataType::PersonalEmail,
            DataProvenance::ThirdParty
        ));
    }
}
