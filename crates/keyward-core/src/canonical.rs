//! Canonical request encoding for signing.
//!
//! Builds the deterministic string both sides of the protocol sign:
//!
//! ```text
//! UPPERCASE(method) & pct(normalize(url)) & pct(sorted "k=v" pairs, "&"-joined)
//! ```
//!
//! Determinism is the load-bearing property: the signer and the verifier
//! must derive byte-identical strings independently, so parameters iterate
//! in byte-wise key order (`BTreeMap`) and percent-encoding is implemented
//! here rather than delegated, with space always `%20` and never `+`.
//! The canonical string is only ever hashed; it is never decoded.

use std::collections::BTreeMap;

use crate::error::CoreError;

/// Default port stripped from http URLs.
const HTTP_PORT: &str = ":80";

/// Default port stripped from https URLs.
const HTTPS_PORT: &str = ":443";

/// Bytes left unescaped: the RFC 3986 unreserved set.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

/// Percent-encode a string, escaping everything outside the unreserved set.
///
/// Encodes per UTF-8 byte with uppercase hex digits. Space becomes `%20`.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(char::from_digit((b >> 4) as u32, 16).unwrap().to_ascii_uppercase());
            out.push(char::from_digit((b & 0xf) as u32, 16).unwrap().to_ascii_uppercase());
        }
    }
    out
}

/// Decode a percent-encoded string, with `+` accepted as space.
///
/// Used only on the wire-form side; the canonical string itself is never
/// decoded.
pub fn percent_decode(input: &str) -> Result<String, CoreError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| CoreError::InvalidForm("truncated escape".into()))?;
                let s = std::str::from_utf8(hex)
                    .map_err(|_| CoreError::InvalidForm("non-ascii escape".into()))?;
                let b = u8::from_str_radix(s, 16)
                    .map_err(|_| CoreError::InvalidForm(format!("bad escape %{}", s)))?;
                out.push(b);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| CoreError::InvalidForm("invalid utf-8".into()))
}

/// Normalize a base URL: lowercase and strip the scheme's default port.
///
/// The port is removed only when it is the exact default for the scheme
/// and sits at the end of the authority; `:8080` and `:8443` survive.
pub fn normalize_base_url(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    strip_default_port(&lower)
}

fn strip_default_port(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some(parts) => parts,
        None => return url.to_owned(),
    };
    let default_port = match scheme {
        "http" => HTTP_PORT,
        "https" => HTTPS_PORT,
        _ => return url.to_owned(),
    };
    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    match authority.strip_suffix(default_port) {
        Some(host) => format!("{}://{}{}", scheme, host, path),
        None => url.to_owned(),
    }
}

/// Encode the normalized parameters query: sorted, encoded `k=v` pairs
/// joined with `&`.
pub fn normalize_parameters(params: &BTreeMap<String, String>) -> String {
    let mut query = String::new();
    for (key, value) in params {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&percent_encode(key));
        query.push('=');
        query.push_str(&percent_encode(value));
    }
    query
}

/// Build the full signature base string for a request.
pub fn signature_base(
    method: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normalize_base_url(url)),
        percent_encode(&normalize_parameters(params)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_percent_encode_space_is_20() {
        assert_eq!(percent_encode("a b"), "a%20b");
    }

    #[test]
    fn test_percent_encode_unreserved_untouched() {
        assert_eq!(percent_encode("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn test_percent_encode_utf8_bytes() {
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_normalize_strips_default_ports() {
        assert_eq!(
            normalize_base_url("http://Agent.example:80/token"),
            "http://agent.example/token"
        );
        assert_eq!(
            normalize_base_url("https://agent.example:443/token"),
            "https://agent.example/token"
        );
        // Non-default ports survive, including ones ending in a default.
        assert_eq!(
            normalize_base_url("https://agent.example:8443/token"),
            "https://agent.example:8443/token"
        );
        assert_eq!(
            normalize_base_url("http://agent.example:8080/token"),
            "http://agent.example:8080/token"
        );
        // A default port inside the path is untouched.
        assert_eq!(
            normalize_base_url("https://agent.example/token:443"),
            "https://agent.example/token:443"
        );
    }

    #[test]
    fn test_signature_base_matches_known_vector() {
        let p = params(&[("client_id", "c1"), ("nonce", "n1"), ("timestamp", "1000")]);
        assert_eq!(
            signature_base("post", "https://agent/token", &p),
            "POST&https%3A%2F%2Fagent%2Ftoken&client_id%3Dc1%26nonce%3Dn1%26timestamp%3D1000"
        );
    }

    #[test]
    fn test_parameters_sorted_by_key() {
        let p = params(&[("z", "1"), ("a", "2"), ("m", "3")]);
        assert_eq!(normalize_parameters(&p), "a=2&m=3&z=1");
    }

    #[test]
    fn test_percent_decode_roundtrip() {
        let original = "key=value with spaces&more";
        let decoded = percent_decode(&percent_encode(original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_percent_decode_plus_as_space() {
        assert_eq!(percent_decode("a+b").unwrap(), "a b");
    }

    #[test]
    fn test_percent_decode_rejects_truncated_escape() {
        assert!(percent_decode("%2").is_err());
        assert!(percent_decode("%zz").is_err());
    }

    proptest! {
        #[test]
        fn prop_encode_deterministic(pairs in proptest::collection::btree_map(
            "[a-z]{1,8}", "[ -~]{0,16}", 0..8)) {
            prop_assert_eq!(
                signature_base("POST", "https://agent/svc", &pairs),
                signature_base("POST", "https://agent/svc", &pairs)
            );
        }

        #[test]
        fn prop_decode_inverts_encode(s in "[ -~]{0,32}") {
            prop_assert_eq!(percent_decode(&percent_encode(&s)).unwrap(), s);
        }

        #[test]
        fn prop_insertion_order_irrelevant(mut pairs in proptest::collection::vec(
            ("[a-z]{1,8}", "[a-z]{0,8}"), 0..8)) {
            let forward: BTreeMap<_, _> = pairs.iter().cloned().collect();
            pairs.reverse();
            let backward: BTreeMap<_, _> = pairs.into_iter().collect();
            prop_assert_eq!(
                normalize_parameters(&forward),
                normalize_parameters(&backward)
            );
        }
    }
}
