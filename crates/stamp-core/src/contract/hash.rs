//! Content hashes with fixed namespace prefixes.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{Result, StampError};

/// Hex characters kept from the SHA-256 digest.
pub const HASH_HEX_LEN: usize = 24;

pub const FILE_HASH_PREFIX: &str = "uif:";
pub const SEMANTIC_HASH_PREFIX: &str = "uis:";
pub const BUNDLE_HASH_PREFIX: &str = "uifb:";

fn digest(prefix: &str, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hex = format!("{:x}", hasher.finalize());
    format!("{prefix}{}", &hex[..HASH_HEX_LEN])
}

/// Formatting-sensitive hash of raw file text.
pub fn file_hash(text: &str) -> String {
    digest(FILE_HASH_PREFIX, text.as_bytes())
}

/// Hash of `value` serialized as JSON with recursively sorted object keys.
pub fn canonical_hash<T: Serialize>(prefix: &str, value: &T, what: &'static str) -> Result<String> {
    let value = serde_json::to_value(value).map_err(|source| StampError::Serialize { what, source })?;
    let bytes = serde_json::to_vec(&canonicalize(value))
        .map_err(|source| StampError::Serialize { what, source })?;
    Ok(digest(prefix, &bytes))
}

/// Rebuild every object with keys in ascending order.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Whether `hash` has the given prefix followed by exactly 24 lowercase hex chars.
pub fn is_well_formed(hash: &str, prefix: &str) -> bool {
    hash.strip_prefix(prefix).is_some_and(|hex| {
        hex.len() == HASH_HEX_LEN && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}
