//! Policy vocabularies: data uses, provenances, and interaction purposes.
//!
//! Flat enumerations, unlike [`DataType`](crate::DataType) which carries a
//! hierarchy. Names are stable for wire and storage use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

macro_rules! vocabulary {
    ($(#[$doc:meta])* $enum_name:ident, $err:ident, { $($variant:ident => $name:literal),* $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $enum_name {
            $($variant),*
        }

        impl $enum_name {
            /// Stable wire/storage name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($enum_name::$variant => $name),*
                }
            }

            /// Every variant, in declaration order.
            pub const ALL: &'static [$enum_name] = &[$($enum_name::$variant),*];
        }

        impl FromStr for $enum_name {
            type Err = PolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($enum_name::$variant),)*
                    other => Err(PolicyError::$err(other.to_owned())),
                }
            }
        }

        impl fmt::Display for $enum_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(
    /// What a controller intends to do with decrypted data.
    DataUse,
    UnknownDataUse,
    {
        ComposeEmailToSubject => "COMPOSE_EMAIL_TO_SUBJECT",
        ComposeLetterToSubject => "COMPOSE_LETTER_TO_SUBJECT",
        SendPackageToSubject => "SEND_PACKAGE_TO_SUBJECT",
        SendSmsToSubject => "SEND_SMS_TO_SUBJECT",
        VisitSubject => "VISIT_SUBJECT",
        InteractWithSubjectOverPhone => "INTERACT_WITH_SUBJECT_OVER_PHONE",
        InteractWithSubjectOverChat => "INTERACT_WITH_SUBJECT_OVER_CHAT",
        QueryThirdParty => "QUERY_THIRD_PARTY",
        NotifyThirdParty => "NOTIFY_THIRD_PARTY",
        UpdateThirdPartyData => "UPDATE_THIRD_PARTY_DATA",
        Intranet => "INTRANET",
        Www => "WWW",
        PublishInternal => "PUBLISH_INTERNAL",
        PublishWorld => "PUBLISH_WORLD",
        BroadcastVoice => "BROADCAST_VOICE",
        BroadcastVideo => "BROADCAST_VIDEO",
        Report => "REPORT",
        Analytics => "ANALYTICS",
        ApplicationDesktop => "APPLICATION_DESKTOP",
        ApplicationRemote => "APPLICATION_REMOTE",
        Other => "OTHER",
    }
);

vocabulary!(
    /// Where a piece of personal data came from.
    DataProvenance,
    UnknownProvenance,
    {
        DataSubjectExplicit => "DATA_SUBJECT_EXPLICIT",
        DataSubjectBehavior => "DATA_SUBJECT_BEHAVIOR",
        DataController => "DATA_CONTROLLER",
        PublicRegistry => "PUBLIC_REGISTRY",
        PublicData => "PUBLIC_DATA",
        ThirdParty => "THIRD_PARTY",
        Other => "OTHER",
    }
);

vocabulary!(
    /// Why the controller wants to interact with the subject, by urgency.
    InteractionPurpose,
    UnknownPurpose,
    {
        Advert => "ADVERT",
        Informative => "INFORMATIVE",
        Important => "IMPORTANT",
        Contractual => "CONTRACTUAL",
        Regulatory => "REGULATORY",
        Critical => "CRITICAL",
        Alert => "ALERT",
        Emergency => "EMERGENCY",
    }
);
