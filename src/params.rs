//! Canonical parameter serialization.
//!
//! The canonical string is the single serialized form of a parameter set:
//! the same string is signed and encrypted, so two parameter sets with
//! identical entries must always canonicalize identically regardless of
//! insertion order.

use std::collections::BTreeMap;

use rand::Rng;
use serde_json::{Map, Value};

use crate::error::Error;

/// Flat key/value parameter set for a single API call.
pub type ParameterSet = Map<String, Value>;

/// Serialize a parameter set into its canonical string.
///
/// Keys are sorted lexicographically by their raw (non-encoded) form.
/// Entries whose value is `null` or the empty string are dropped; numeric
/// zero and `false` are kept. Values are percent-encoded as UTF-8, so
/// non-ASCII names serialize to their correct byte sequence.
pub fn serialize_params(params: &ParameterSet) -> String {
    let mut entries: Vec<(&str, String)> = params
        .iter()
        .filter_map(|(k, v)| render_value(v).map(|r| (k.as_str(), r)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Inverse of [`serialize_params`] for decrypted callback strings.
///
/// Flat `key=value` pairs only; no array or nested support.
pub fn deserialize_params(input: &str) -> Result<BTreeMap<String, String>, Error> {
    let mut map = BTreeMap::new();
    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.insert(form_decode(key)?, form_decode(value)?);
    }
    Ok(map)
}

// Form semantics: '+' is a space, then percent-decode.
fn form_decode(component: &str) -> Result<String, Error> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| Error::Encoding(e.to_string()))
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Nested values are expected to arrive pre-encoded as JSON strings;
        // anything else is rendered as compact JSON.
        other => serde_json::to_string(other).ok(),
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Default length of a generated transaction identifier.
pub const TRANSACTION_ID_LEN: usize = 32;

/// Generate a per-call transaction identifier.
///
/// Lowercase base-36, a uniqueness token required by the upstream service,
/// not a cryptographic nonce. Upstream reference clients drop a leading
/// `'0'` instead of re-rolling it, so the result may come out shorter than
/// `len`; preserved for wire compatibility.
pub fn random_transaction_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..ID_ALPHABET.len());
        if idx != 0 || !out.is_empty() {
            out.push(ID_ALPHABET[idx] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_set(value: Value) -> ParameterSet {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_serialize_sorts_and_filters() {
        let params = to_set(json!({
            "name": "中文",
            "mobile": 1,
            "product_code": "w1010100000000000103",
            "transaction_id": null
        }));
        assert_eq!(
            serialize_params(&params),
            "mobile=1&name=%E4%B8%AD%E6%96%87&product_code=w1010100000000000103"
        );
    }

    #[test]
    fn test_serialize_order_independent() {
        let a = to_set(json!({"b": 2, "a": 1}));
        let b = to_set(json!({"a": 1, "b": 2}));
        assert_eq!(serialize_params(&a), "a=1&b=2");
        assert_eq!(serialize_params(&a), serialize_params(&b));
    }

    #[test]
    fn test_serialize_keeps_zero_and_false() {
        let params = to_set(json!({"x": 0, "y": null, "z": "", "w": false}));
        assert_eq!(serialize_params(&params), "w=false&x=0");
    }

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize_params(&ParameterSet::new()), "");
    }

    #[test]
    fn test_serialize_percent_encodes_reserved() {
        let params = to_set(json!({"state": "a b&c=d"}));
        assert_eq!(serialize_params(&params), "state=a%20b%26c%3Dd");
    }

    #[test]
    fn test_deserialize_round_trip() {
        let decoded = deserialize_params("name=%E4%B8%AD%E6%96%87&open_id=abc123").unwrap();
        assert_eq!(decoded.get("name").unwrap(), "中文");
        assert_eq!(decoded.get("open_id").unwrap(), "abc123");
    }

    #[test]
    fn test_deserialize_pair_without_value() {
        let decoded = deserialize_params("flag&open_id=x").unwrap();
        assert_eq!(decoded.get("flag").unwrap(), "");
        assert_eq!(decoded.get("open_id").unwrap(), "x");
    }

    #[test]
    fn test_deserialize_plus_as_space() {
        let decoded = deserialize_params("memo=hello+world").unwrap();
        assert_eq!(decoded.get("memo").unwrap(), "hello world");
    }

    #[test]
    fn test_deserialize_empty() {
        assert!(deserialize_params("").unwrap().is_empty());
    }

    #[test]
    fn test_transaction_id_shape() {
        for _ in 0..50 {
            let id = random_transaction_id(TRANSACTION_ID_LEN);
            assert!(id.len() <= TRANSACTION_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            if let Some(first) = id.chars().next() {
                assert_ne!(first, '0');
            }
        }
    }
}
