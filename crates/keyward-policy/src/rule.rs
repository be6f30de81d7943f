//! Authorization rules: what a subject has allowed a controller to do.
//!
//! A rule scopes policy to one (subject, controller, data type) triple and
//! owns its allowance entries outright. Entries are time-bounded with a
//! half-open `[valid_from, valid_to)` window; `valid_to = None` means no
//! expiry. An entry with a `None` use/provenance and an open window is the
//! "locked" marker: the rule exists but currently allows nothing.
//!
//! Rules are never hard-deleted, only locked; individual allowances come
//! and go as the subject edits their policy.

use serde::{Deserialize, Serialize};

use keyward_core::{ControllerId, SubjectId, UnixMillis};

use crate::datatype::DataType;
use crate::terms::{DataProvenance, DataUse};

fn window_contains(valid_from: UnixMillis, valid_to: Option<UnixMillis>, now: UnixMillis) -> bool {
    now >= valid_from && valid_to.map_or(true, |end| now < end)
}

/// A permitted use of the data, bounded in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableAction {
    /// The permitted use; `None` marks a locked rule.
    pub data_use: Option<DataUse>,
    /// Start of the allowance window (Unix ms).
    pub valid_from: UnixMillis,
    /// End of the window; `None` means no expiry.
    pub valid_to: Option<UnixMillis>,
}

impl AllowableAction {
    /// True iff this entry permits `data_use` at `now`.
    pub fn permits(&self, data_use: DataUse, now: UnixMillis) -> bool {
        self.data_use == Some(data_use) && window_contains(self.valid_from, self.valid_to, now)
    }
}

/// A permitted source of the data, bounded in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowableProvenance {
    /// The permitted provenance; `None` marks a locked rule.
    pub provenance: Option<DataProvenance>,
    /// Start of the allowance window (Unix ms).
    pub valid_from: UnixMillis,
    /// End of the window; `None` means no expiry.
    pub valid_to: Option<UnixMillis>,
}

impl AllowableProvenance {
    /// True iff this entry permits `provenance` at `now`.
    pub fn permits(&self, provenance: DataProvenance, now: UnixMillis) -> bool {
        self.provenance == Some(provenance)
            && window_contains(self.valid_from, self.valid_to, now)
    }
}

/// Policy for one (subject, controller, data type) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRule {
    pub subject: SubjectId,
    pub controller: ControllerId,
    pub data_type: DataType,
    pub actions: Vec<AllowableAction>,
    pub provenances: Vec<AllowableProvenance>,
}

impl AuthorizationRule {
    /// A rule with no allowances yet.
    pub fn new(subject: SubjectId, controller: ControllerId, data_type: DataType) -> Self {
        Self {
            subject,
            controller,
            data_type,
            actions: Vec::new(),
            provenances: Vec::new(),
        }
    }

    /// True iff any entry permits `data_use` at `now`.
    pub fn allows_use(&self, data_use: DataUse, now: UnixMillis) -> bool {
        self.actions.iter().any(|a| a.permits(data_use, now))
    }

    /// True iff any entry permits `provenance` at `now`.
    pub fn allows_provenance(&self, provenance: DataProvenance, now: UnixMillis) -> bool {
        self.provenances.iter().any(|p| p.permits(provenance, now))
    }

    /// Grant a use, replacing any previous allowance for the same use and
    /// clearing a locked marker if one is present.
    pub fn allow_use(
        &mut self,
        data_use: DataUse,
        valid_from: UnixMillis,
        valid_to: Option<UnixMillis>,
    ) {
        self.actions
            .retain(|a| a.data_use.is_some() && a.data_use != Some(data_use));
        self.actions.push(AllowableAction {
            data_use: Some(data_use),
            valid_from,
            valid_to,
        });
    }

    /// Grant a provenance, same replacement semantics as [`allow_use`].
    ///
    /// [`allow_use`]: AuthorizationRule::allow_use
    pub fn allow_provenance(
        &mut self,
        provenance: DataProvenance,
        valid_from: UnixMillis,
        valid_to: Option<UnixMillis>,
    ) {
        self.provenances
            .retain(|p| p.provenance.is_some() && p.provenance != Some(provenance));
        self.provenances.push(AllowableProvenance {
            provenance: Some(provenance),
            valid_from,
            valid_to,
        });
    }

    /// Withdraw a single use allowance.
    pub fn revoke_use(&mut self, data_use: DataUse) {
        self.actions.retain(|a| a.data_use != Some(data_use));
    }

    /// Withdraw a single provenance allowance.
    pub fn revoke_provenance(&mut self, provenance: DataProvenance) {
        self.provenances.retain(|p| p.provenance != Some(provenance));
    }

    /// Lock the rule: drop every allowance and leave the null markers with
    /// an open window, so the rule still exists but permits nothing.
    pub fn lock(&mut self, now: UnixMillis) {
        self.actions.clear();
        self.actions.push(AllowableAction {
            data_use: None,
            valid_from: now,
            valid_to: None,
        });
        self.provenances.clear();
        self.provenances.push(AllowableProvenance {
            provenance: None,
            valid_from: now,
            valid_to: None,
        });
    }

    /// True iff the rule holds only null (locked) markers.
    pub fn is_locked(&self) -> bool {
        self.actions.iter().all(|a| a.data_use.is_none())
            && self.provenances.iter().all(|p| p.provenance.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> AuthorizationRule {
        AuthorizationRule::new(
            SubjectId::new("alice"),
            ControllerId::new("shop"),
            DataType::PersonalEmail,
        )
    }

    #[test]
    fn test_empty_rule_allows_nothing() {
        let r = rule();
        assert!(!r.allows_use(DataUse::ComposeEmailToSubject, 0));
        assert!(!r.allows_provenance(DataProvenance::DataSubjectExplicit, 0));
    }

    #[test]
    fn test_allow_use_within_window() {
        let mut r = rule();
        r.allow_use(DataUse::ComposeEmailToSubject, 100, Some(200));
        assert!(!r.allows_use(DataUse::ComposeEmailToSubject, 99));
        assert!(r.allows_use(DataUse::ComposeEmailToSubject, 100));
        assert!(r.allows_use(DataUse::ComposeEmailToSubject, 199));
        // Half-open window: the end instant is excluded.
        assert!(!r.allows_use(DataUse::ComposeEmailToSubject, 200));
    }

    #[test]
    fn test_open_ended_window_never_expires() {
        let mut r = rule();
        r.allow_use(DataUse::SendSmsToSubject, 0, None);
        assert!(r.allows_use(DataUse::SendSmsToSubject, i64::MAX));
    }

    #[test]
    fn test_multiple_allowances_coexist() {
        let mut r = rule();
        r.allow_use(DataUse::ComposeEmailToSubject, 0, None);
        r.allow_use(DataUse::SendSmsToSubject, 0, Some(50));
        assert!(r.allows_use(DataUse::ComposeEmailToSubject, 100));
        assert!(!r.allows_use(DataUse::SendSmsToSubject, 100));
        assert_eq!(r.actions.len(), 2);
    }

    #[test]
    fn test_allow_use_replaces_same_use() {
        let mut r = rule();
        r.allow_use(DataUse::ComposeEmailToSubject, 0, Some(50));
        r.allow_use(DataUse::ComposeEmailToSubject, 0, None);
        assert_eq!(r.actions.len(), 1);
        assert!(r.allows_use(DataUse::ComposeEmailToSubject, 100));
    }

    #[test]
    fn test_lock_clears_and_marks() {
        let mut r = rule();
        r.allow_use(DataUse::ComposeEmailToSubject, 0, None);
        r.allow_provenance(DataProvenance::DataSubjectExplicit, 0, None);
        r.lock(500);
        assert!(r.is_locked());
        assert!(!r.allows_use(DataUse::ComposeEmailToSubject, 1_000));
        assert!(!r.allows_provenance(DataProvenance::DataSubjectExplicit, 1_000));
        // The rule container survives the lock.
        assert_eq!(r.actions.len(), 1);
    }

    #[test]
    fn test_relock_after_grant() {
        let mut r = rule();
        r.lock(0);
        r.allow_use(DataUse::Report, 10, None);
        assert!(!r.is_locked());
        assert!(r.allows_use(DataUse::Report, 20));
        r.lock(30);
        assert!(!r.allows_use(DataUse::Report, 40));
    }

    #[test]
    fn test_revoke_use_leaves_rule_in_place() {
        let mut r = rule();
        r.allow_use(DataUse::Report, 0, None);
        r.revoke_use(DataUse::Report);
        assert!(!r.allows_use(DataUse::Report, 10));
        assert!(r.actions.is_empty());
    }
}
