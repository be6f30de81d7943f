//! Wire form encoding of reply messages.
//!
//! Replies travel as URL-encoded `key=value` pairs, one per public field,
//! in a fixed field order, percent-encoded with the same rules the
//! canonical encoder uses (space is `%20`, never `+` on output). Each
//! message type carries an explicit, hand-written field list so that every
//! field provably round-trips.

use crate::canonical::{percent_decode, percent_encode};
use crate::error::CoreError;
use crate::model::EncryptionKey;
use crate::types::{ClientId, Secret, TokenId};

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&percent_encode(key));
        out.push('=');
        out.push_str(&percent_encode(value));
    }
    out
}

fn decode_pairs(form: &str) -> Result<Vec<(String, String)>, CoreError> {
    form.split('&')
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| CoreError::InvalidForm(format!("missing '=' in {:?}", pair)))?;
            Ok((percent_decode(key)?, percent_decode(value)?))
        })
        .collect()
}

fn field<'a>(pairs: &'a [(String, String)], name: &str) -> Result<&'a str, CoreError> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| CoreError::InvalidForm(format!("missing field {:?}", name)))
}

/// Credentials returned by client registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: Secret,
}

impl ClientCredentials {
    /// Field order: `client_id`, `client_secret`.
    pub fn to_form(&self) -> String {
        encode_pairs(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", &self.client_secret.to_hex()),
        ])
    }

    pub fn from_form(form: &str) -> Result<Self, CoreError> {
        let pairs = decode_pairs(form)?;
        Ok(Self {
            client_id: ClientId::new(field(&pairs, "client_id")?),
            client_secret: Secret::from_hex(field(&pairs, "client_secret")?)
                .map_err(|e| CoreError::InvalidForm(e.to_string()))?,
        })
    }
}

/// A freshly minted request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReply {
    pub request_token: TokenId,
    pub token_secret: Secret,
}

impl TokenReply {
    /// Field order: `request_token`, `token_secret`.
    pub fn to_form(&self) -> String {
        encode_pairs(&[
            ("request_token", self.request_token.as_str()),
            ("token_secret", &self.token_secret.to_hex()),
        ])
    }

    pub fn from_form(form: &str) -> Result<Self, CoreError> {
        let pairs = decode_pairs(form)?;
        Ok(Self {
            request_token: TokenId::new(field(&pairs, "request_token")?),
            token_secret: Secret::from_hex(field(&pairs, "token_secret")?)
                .map_err(|e| CoreError::InvalidForm(e.to_string()))?,
        })
    }
}

/// The key released by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReply {
    pub encryption_key: EncryptionKey,
}

impl KeyReply {
    /// Field order: `encryption_key`.
    pub fn to_form(&self) -> String {
        encode_pairs(&[("encryption_key", &self.encryption_key.to_hex())])
    }

    pub fn from_form(form: &str) -> Result<Self, CoreError> {
        let pairs = decode_pairs(form)?;
        Ok(Self {
            encryption_key: EncryptionKey::from_hex(field(&pairs, "encryption_key")?)
                .map_err(|e| CoreError::InvalidForm(e.to_string()))?,
        })
    }
}
