//! Per-key write options and key prefix scoping

use serde::{Deserialize, Serialize};

/// Options applied after a write command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOptions {
    /// Expiry in seconds, sent as `EXPIRE key seconds` after the write
    pub expire: Option<u64>,
}

impl KeyOptions {
    pub fn expire(seconds: u64) -> Self {
        Self {
            expire: Some(seconds),
        }
    }

    pub(crate) fn expire_seconds(&self) -> Option<i64> {
        self.expire
            .map(|seconds| i64::try_from(seconds).unwrap_or(i64::MAX))
    }
}

/// Namespace transparently added to outgoing keys and stripped from scanned ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key as stored on the server
    pub fn apply(&self, key: &str) -> String {
        if self.0.is_empty() {
            return key.to_string();
        }
        let mut full = String::with_capacity(self.0.len() + key.len());
        full.push_str(&self.0);
        full.push_str(key);
        full
    }

    /// SCAN MATCH pattern for a caller pattern.
    ///
    /// Glob metacharacters inside the prefix are escaped so the prefix
    /// only ever matches itself.
    pub fn resolve_pattern(&self, pattern: &str) -> String {
        let mut resolved = String::with_capacity(self.0.len() * 2 + pattern.len());
        for c in self.0.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                resolved.push('\\');
            }
            resolved.push(c);
        }
        resolved.push_str(pattern);
        resolved
    }

    /// Key as seen by callers. Keys outside the namespace are returned unchanged.
    pub fn strip<'k>(&self, key: &'k str) -> &'k str {
        key.strip_prefix(self.0.as_str()).unwrap_or(key)
    }
}

impl From<&str> for KeyPrefix {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

impl From<Option<String>> for KeyPrefix {
    fn from(prefix: Option<String>) -> Self {
        Self(prefix.unwrap_or_default())
    }
}
