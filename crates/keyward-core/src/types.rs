//! Typed identifiers and shared primitives.
//!
//! Identifiers are opaque strings (UUIDs in practice) wrapped in newtypes so
//! that a client id can never be passed where a token id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

id_type!(
    /// Identifies one (subject, controller, application) registration.
    ClientId
);
id_type!(
    /// Identifies a short-lived request token.
    TokenId
);
id_type!(
    /// Identifies a data subject: the person the data is about.
    SubjectId
);
id_type!(
    /// Identifies a data controller: the organization holding the data.
    ControllerId
);
id_type!(
    /// Identifies an authorized application acting for a controller.
    ApplicationId
);

/// A shared secret used as HMAC key material.
///
/// Secrets travel hex-encoded; `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Transport form: lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

/// Unix timestamp in milliseconds.
pub type UnixMillis = i64;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> UnixMillis {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_roundtrip() {
        let id = ClientId::new("c1");
        assert_eq!(id.to_string(), "c1");
        assert_eq!(id.as_str(), "c1");
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let secret = Secret::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(secret.to_hex(), "deadbeef");
        assert_eq!(Secret::from_hex("deadbeef").unwrap(), secret);
    }

    #[test]
    fn test_secret_debug_redacts() {
        let secret = Secret::from_bytes(vec![1, 2, 3]);
        let dbg = format!("{:?}", secret);
        assert!(!dbg.contains("01"));
        assert_eq!(dbg, "Secret(3 bytes)");
    }
}
