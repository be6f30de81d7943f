//! Signed request bundles: the parameters a protocol request carries.
//!
//! A request is a method, a URL, a flat set of parameters, and a signature
//! over the canonical encoding of the first three. The parameter map is a
//! `BTreeMap` so the verifier recomputes the same canonical string the
//! signer produced regardless of arrival order.
//!
//! Well-known parameter names are constants here; typed accessors parse
//! them out with per-parameter errors.

use std::collections::BTreeMap;
use std::str::FromStr;

use keyward_core::{signature_base, ClientId, TokenId, UnixMillis};
use keyward_policy::{
    DataProvenance, DataType, DataUse, InteractionPurpose, RequestKind,
};

use crate::error::{KernelError, Result};

/// Authentication parameters present on every signed request.
pub const PARAM_CLIENT_ID: &str = "client_id";
pub const PARAM_NONCE: &str = "nonce";
pub const PARAM_TIMESTAMP: &str = "timestamp";

/// Present once a request token exists.
pub const PARAM_REQUEST_TOKEN: &str = "request_token";

/// Policy parameters carried by authorization and exchange requests.
pub const PARAM_DATA_TYPE: &str = "data_type";
pub const PARAM_DATA_USE: &str = "data_use";
pub const PARAM_PURPOSE: &str = "purpose";
pub const PARAM_PROVENANCE: &str = "provenance";
pub const PARAM_UPDATE: &str = "update";

/// One signed protocol request, as received.
///
/// `params` holds every signed parameter; the signature itself is never a
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP-style method, case-insensitive on input.
    pub method: String,

    /// The request URL before normalization.
    pub url: String,

    /// All signed parameters.
    pub params: BTreeMap<String, String>,

    /// Hex-encoded HMAC over the canonical encoding.
    pub signature: String,
}

impl SignedRequest {
    /// The canonical string this request's signature covers.
    pub fn base_string(&self) -> String {
        signature_base(&self.method, &self.url, &self.params)
    }

    /// Fetch a required parameter.
    pub fn param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| KernelError::MissingParameter(name.to_owned()))
    }

    pub fn client_id(&self) -> Result<ClientId> {
        Ok(ClientId::new(self.param(PARAM_CLIENT_ID)?))
    }

    pub fn nonce(&self) -> Result<&str> {
        self.param(PARAM_NONCE)
    }

    pub fn timestamp(&self) -> Result<UnixMillis> {
        let raw = self.param(PARAM_TIMESTAMP)?;
        raw.parse().map_err(|_| KernelError::InvalidParameter {
            name: PARAM_TIMESTAMP.to_owned(),
            value: raw.to_owned(),
        })
    }

    pub fn token_id(&self) -> Result<TokenId> {
        Ok(TokenId::new(self.param(PARAM_REQUEST_TOKEN)?))
    }

    pub fn data_type(&self) -> Result<DataType> {
        let raw = self.param(PARAM_DATA_TYPE)?;
        DataType::from_str(raw).map_err(|_| KernelError::InvalidParameter {
            name: PARAM_DATA_TYPE.to_owned(),
            value: raw.to_owned(),
        })
    }

    /// Parse the requested access out of the policy parameters.
    ///
    /// A `provenance` parameter makes this an encryption request (with an
    /// optional boolean `update`, absent meaning first-time storage);
    /// otherwise `data_use` and `purpose` are required and make it a
    /// decryption request.
    pub fn request_kind(&self) -> Result<RequestKind> {
        if let Some(raw) = self.params.get(PARAM_PROVENANCE) {
            let provenance =
                DataProvenance::from_str(raw).map_err(|_| KernelError::InvalidParameter {
                    name: PARAM_PROVENANCE.to_owned(),
                    value: raw.clone(),
                })?;
            let update = match self.params.get(PARAM_UPDATE).map(String::as_str) {
                None | Some("false") => false,
                Some("true") => true,
                Some(other) => {
                    return Err(KernelError::InvalidParameter {
                        name: PARAM_UPDATE.to_owned(),
                        value: other.to_owned(),
                    })
                }
            };
            return Ok(RequestKind::Encryption { provenance, update });
        }

        let raw_use = self.param(PARAM_DATA_USE)?;
        let data_use = DataUse::from_str(raw_use).map_err(|_| KernelError::InvalidParameter {
            name: PARAM_DATA_USE.to_owned(),
            value: raw_use.to_owned(),
        })?;
        let raw_purpose = self.param(PARAM_PURPOSE)?;
        let purpose =
            InteractionPurpose::from_str(raw_purpose).map_err(|_| {
                KernelError::InvalidParameter {
                    name: PARAM_PURPOSE.to_owned(),
                    value: raw_purpose.to_owned(),
                }
            })?;
        Ok(RequestKind::Decryption { data_use, purpose })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, &str)]) -> SignedRequest {
        SignedRequest {
            method: "POST".into(),
            url: "https://agent/token".into(),
            params: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            signature: "00".into(),
        }
    }

    #[test]
    fn test_auth_params_parse() {
        let req = request(&[
            (PARAM_CLIENT_ID, "c1"),
            (PARAM_NONCE, "n1"),
            (PARAM_TIMESTAMP, "1000"),
        ]);
        assert_eq!(req.client_id().unwrap(), ClientId::new("c1"));
        assert_eq!(req.nonce().unwrap(), "n1");
        assert_eq!(req.timestamp().unwrap(), 1_000);
    }

    #[test]
    fn test_missing_parameter_named() {
        let req = request(&[(PARAM_CLIENT_ID, "c1")]);
        match req.nonce() {
            Err(KernelError::MissingParameter(name)) => assert_eq!(name, PARAM_NONCE),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let req = request(&[(PARAM_TIMESTAMP, "soon")]);
        assert!(matches!(
            req.timestamp(),
            Err(KernelError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_decryption_kind() {
        let req = request(&[
            (PARAM_DATA_USE, "COMPOSE_EMAIL_TO_SUBJECT"),
            (PARAM_PURPOSE, "INFORMATIVE"),
        ]);
        assert!(matches!(
            req.request_kind().unwrap(),
            RequestKind::Decryption { .. }
        ));
    }

    #[test]
    fn test_encryption_kind_update_defaults_false() {
        let req = request(&[(PARAM_PROVENANCE, "DATA_SUBJECT_EXPLICIT")]);
        assert_eq!(
            req.request_kind().unwrap(),
            RequestKind::Encryption {
                provenance: DataProvenance::DataSubjectExplicit,
                update: false,
            }
        );
    }

    #[test]
    fn test_base_string_independent_of_build_order() {
        let a = request(&[(PARAM_CLIENT_ID, "c1"), (PARAM_NONCE, "n1")]);
        let b = request(&[(PARAM_NONCE, "n1"), (PARAM_CLIENT_ID, "c1")]);
        assert_eq!(a.base_string(), b.base_string());
    }
}
