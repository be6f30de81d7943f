//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use keyward_core::{Secret, UnixMillis};
use keyward_policy::{
    DataProvenance, DataType, DataUse, InteractionPurpose, RequestKind,
};

/// Generate any data type.
pub fn data_type() -> impl Strategy<Value = DataType> {
    proptest::sample::select(DataType::ALL)
}

/// Generate any data use.
pub fn data_use() -> impl Strategy<Value = DataUse> {
    proptest::sample::select(DataUse::ALL)
}

/// Generate any data provenance.
pub fn provenance() -> impl Strategy<Value = DataProvenance> {
    proptest::sample::select(DataProvenance::ALL)
}

/// Generate any interaction purpose.
pub fn purpose() -> impl Strategy<Value = InteractionPurpose> {
    proptest::sample::select(InteractionPurpose::ALL)
}

/// Generate a request kind with consistent fields.
pub fn request_kind() -> impl Strategy<Value = RequestKind> {
    prop_oneof![
        (provenance(), any::<bool>())
            .prop_map(|(provenance, update)| RequestKind::Encryption { provenance, update }),
        (data_use(), purpose())
            .prop_map(|(data_use, purpose)| RequestKind::Decryption { data_use, purpose }),
    ]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = UnixMillis> {
    0i64..=i64::MAX / 2
}

/// Generate 20 bytes of secret material.
pub fn secret() -> impl Strategy<Value = Secret> {
    any::<[u8; 20]>().prop_map(|bytes| Secret::from_bytes(bytes.to_vec()))
}

/// Generate a nonce-like opaque string.
pub fn nonce() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{8,32}".prop_map(String::from)
}

/// Generate a parameter key safe for canonical encoding tests.
pub fn param_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}".prop_map(String::from)
}

/// Generate a parameter value, including characters that need escaping.
pub fn param_value() -> impl Strategy<Value = String> {
    "[ -~]{0,32}".prop_map(String::from)
}

/// Generate a parameter map.
pub fn params(max_len: usize) -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(param_key(), param_value(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_data_type_names_roundtrip(dt in data_type()) {
            let parsed: DataType = dt.as_str().parse().unwrap();
            prop_assert_eq!(parsed, dt);
        }

        #[test]
        fn test_request_kind_fields_parse(kind in request_kind()) {
            match kind {
                RequestKind::Encryption { provenance, .. } => {
                    prop_assert!(DataProvenance::ALL.contains(&provenance));
                }
                RequestKind::Decryption { data_use, purpose } => {
                    prop_assert!(DataUse::ALL.contains(&data_use));
                    prop_assert!(InteractionPurpose::ALL.contains(&purpose));
                }
            }
        }
    }
}
