//! Content fingerprint of a configuration document
//!
//! The fingerprint is the Blake3 hash of the document's canonical JSON
//! (object keys sorted, no whitespace), so formatting and key order do not
//! change it while any value change does.

use std::fmt::{self, Display, Formatter};

use serde_json::Value as JsonValue;

/// 32-byte Blake3 fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigFingerprint([u8; 32]);

impl ConfigFingerprint {
    /// Fingerprint a parsed document
    #[must_use]
    pub fn of(value: &JsonValue) -> Self {
        let canonical = canonical_json(value);
        Self(*blake3::hash(canonical.as_bytes()).as_bytes())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ConfigFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Canonical JSON: sorted keys, compact separators, escaped strings
pub(crate) fn canonical_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();

            let parts: Vec<String> = keys
                .into_iter()
                .filter_map(|key| {
                    map.get(key)
                        .map(|val| format!("{}:{}", JsonValue::from(key.as_str()), canonical_json(val)))
                })
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        JsonValue::Array(arr) => {
            let parts: Vec<_> = arr.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}
