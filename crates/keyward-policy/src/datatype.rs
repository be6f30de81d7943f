//! The data-type subsumption hierarchy.
//!
//! Personal-data categories form a fixed tree: each node has at most one
//! parent, and `is_a` walks the ancestor chain iteratively. The hierarchy
//! is static data compiled into the crate; it is never mutated at runtime.
//!
//! Policy lookups lean on subsumption for coarse matching: a default rule
//! for `Identity` covers `GivenName` without an explicit per-leaf entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

macro_rules! data_types {
    ($($variant:ident => ($parent:expr, $name:literal)),* $(,)?) => {
        /// A node in the personal-data category tree.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum DataType {
            $($variant),*
        }

        impl DataType {
            /// The subsumption parent, or `None` for a root category.
            pub fn parent(self) -> Option<DataType> {
                match self {
                    $(DataType::$variant => $parent),*
                }
            }

            /// Stable wire/storage name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(DataType::$variant => $name),*
                }
            }

            /// Every data type, in declaration order.
            pub const ALL: &'static [DataType] = &[$(DataType::$variant),*];
        }

        impl FromStr for DataType {
            type Err = PolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(DataType::$variant),)*
                    other => Err(PolicyError::UnknownDataType(other.to_owned())),
                }
            }
        }
    };
}

use DataType::*;

data_types! {
    // Roots
    Personal => (None, "PERSONAL"),
    Sensitive => (None, "SENSITIVE"),
    Nonpersonal => (None, "NONPERSONAL"),

    // Identity
    Identity => (Some(Personal), "IDENTITY"),
    GivenName => (Some(Identity), "GIVEN_NAME"),
    Surname => (Some(Identity), "SURNAME"),
    Initials => (Some(Identity), "INITIALS"),
    Pseudonym => (Some(Identity), "PSEUDONYM"),
    Title => (Some(Identity), "TITLE"),
    CommonName => (Some(Identity), "COMMON_NAME"),
    Country => (Some(Identity), "COUNTRY"),
    Organization => (Some(Identity), "ORGANIZATION"),
    BirthDate => (Some(Identity), "BIRTH_DATE"),
    BirthYear => (Some(Identity), "BIRTH_YEAR"),
    Nationality => (Some(Identity), "NATIONALITY"),

    // Work contact details
    WorkContact => (Some(Personal), "WORK_CONTACT"),
    WorkLandlinePhone => (Some(WorkContact), "WORK_LANDLINE_PHONE"),
    WorkMobilePhone => (Some(WorkContact), "WORK_MOBILE_PHONE"),
    WorkEmail => (Some(WorkContact), "WORK_EMAIL"),
    WorkStreetAddress => (Some(WorkContact), "WORK_STREET_ADDRESS"),
    WorkCity => (Some(WorkContact), "WORK_CITY"),
    WorkCountry => (Some(WorkContact), "WORK_COUNTRY"),
    WorkPostalCode => (Some(WorkContact), "WORK_POSTAL_CODE"),

    // Home contact details
    HomeContact => (Some(Personal), "HOME_CONTACT"),
    HomePhone => (Some(HomeContact), "HOME_PHONE"),
    PersonalMobilePhone => (Some(HomeContact), "PERSONAL_MOBILE_PHONE"),
    PersonalEmail => (Some(HomeContact), "PERSONAL_EMAIL"),
    HomeStreetAddress => (Some(HomeContact), "HOME_STREET_ADDRESS"),
    HomeCity => (Some(HomeContact), "HOME_CITY"),
    HomeCountry => (Some(HomeContact), "HOME_COUNTRY"),
    HomePostalCode => (Some(HomeContact), "HOME_POSTAL_CODE"),

    // Biometrics
    Biometrical => (Some(Personal), "BIOMETRICAL"),
    Photograph => (Some(Biometrical), "PHOTOGRAPH"),
    Signature => (Some(Biometrical), "SIGNATURE"),
    Fingerprint => (Some(Biometrical), "FINGERPRINT"),
    IrisScan => (Some(Biometrical), "IRIS_SCAN"),

    // Official identification
    OfficialIdentification => (Some(Personal), "OFFICIAL_IDENTIFICATION"),
    TaxIdentificationNumber => (Some(OfficialIdentification), "TAX_IDENTIFICATION_NUMBER"),
    SocialSecurityNumber => (Some(OfficialIdentification), "SOCIAL_SECURITY_NUMBER"),
    PersonalIdentificationNumber => (Some(OfficialIdentification), "PERSONAL_IDENTIFICATION_NUMBER"),
    DriverLicenseNumber => (Some(OfficialIdentification), "DRIVER_LICENSE_NUMBER"),
    PassportNumber => (Some(OfficialIdentification), "PASSPORT_NUMBER"),

    // Online handles
    OnlineHandle => (Some(Personal), "ONLINE_HANDLE"),
    WorkWebPage => (Some(OnlineHandle), "WORK_WEB_PAGE"),
    PersonalWebPage => (Some(OnlineHandle), "PERSONAL_WEB_PAGE"),
    TwitterId => (Some(OnlineHandle), "TWITTER_ID"),
    FacebookId => (Some(OnlineHandle), "FACEBOOK_ID"),
    LinkedinId => (Some(OnlineHandle), "LINKEDIN_ID"),
    SkypeId => (Some(OnlineHandle), "SKYPE_ID"),

    // Sensitive categories
    RacialOrigin => (Some(Sensitive), "RACIAL_ORIGIN"),
    EthnicOrigin => (Some(Sensitive), "ETHNIC_ORIGIN"),
    PoliticalOpinions => (Some(Sensitive), "POLITICAL_OPINIONS"),
    ReligiousBeliefs => (Some(Sensitive), "RELIGIOUS_BELIEFS"),
    TradeUnionMembership => (Some(Sensitive), "TRADE_UNION_MEMBERSHIP"),
    PhilosophicalBeliefs => (Some(Sensitive), "PHILOSOPHICAL_BELIEFS"),
    Health => (Some(Sensitive), "HEALTH"),
    SexLife => (Some(Sensitive), "SEX_LIFE"),
}

impl DataType {
    /// True iff `self` equals `other` or `other` is an ancestor of `self`.
    pub fn is_a(self, other: DataType) -> bool {
        let mut node = Some(self);
        while let Some(current) = node {
            if current == other {
                return true;
            }
            node = current.parent();
        }
        false
    }

    /// The chain from `self` up to its root, inclusive.
    pub fn ancestors(self) -> impl Iterator<Item = DataType> {
        std::iter::successors(Some(self), |node| node.parent())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
