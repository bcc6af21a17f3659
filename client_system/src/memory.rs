//! In-process keyspace implementing [`KeyScanner`]
//!
//! Keys are visited in lexical order. The cursor names the next key to visit,
//! so deleting already-visited keys mid-scan never causes skips. Like the
//! server, COUNT bounds the number of keys examined per page, not the number
//! returned, so pages can be empty before the walk is over.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::errors::ClientError;
use crate::scanner::{INITIAL_CURSOR, KeyScanner};

const CURSOR_MARK: char = '>';

#[derive(Debug, Clone, Default)]
pub struct MemoryKeyspace {
    entries: BTreeMap<String, String>,
    scan_calls: u64,
    delete_calls: u64,
    fail_scan_on_call: Option<u64>,
}

impl MemoryKeyspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys matching a glob pattern, as a one-shot `KEYS` would return them
    pub fn keys_matching(&self, pattern: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect()
    }

    pub fn scan_calls(&self) -> u64 {
        self.scan_calls
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls
    }

    /// Make the n-th `scan_page` call (1-based) fail with an I/O error
    pub fn fail_scan_on_call(mut self, call: u64) -> Self {
        self.fail_scan_on_call = Some(call);
        self
    }
}

#[async_trait]
impl KeyScanner for MemoryKeyspace {
    async fn scan_page(
        &mut self,
        cursor: &str,
        pattern: &str,
        count: usize,
    ) -> Result<(String, Vec<String>), ClientError> {
        self.scan_calls += 1;
        if self.fail_scan_on_call == Some(self.scan_calls) {
            let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
            return Err(redis::RedisError::from(io).into());
        }

        let start = if cursor == INITIAL_CURSOR {
            Bound::Unbounded
        } else {
            match cursor.strip_prefix(CURSOR_MARK) {
                Some(next_key) => Bound::Included(next_key),
                None => {
                    return Err(ClientError::InvalidArgument(format!(
                        "invalid cursor: {cursor}"
                    )));
                }
            }
        };

        let mut slots = self
            .entries
            .range::<str, _>((start, Bound::Unbounded))
            .map(|(key, _)| key);

        let keys: Vec<String> = slots
            .by_ref()
            .take(count.max(1))
            .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect();

        let next_cursor = match slots.next() {
            Some(next_key) => format!("{CURSOR_MARK}{next_key}"),
            None => INITIAL_CURSOR.to_string(),
        };

        Ok((next_cursor, keys))
    }

    async fn delete_keys(&mut self, keys: &[String]) -> Result<u64, ClientError> {
        self.delete_calls += 1;
        let deleted = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(deleted as u64)
    }
}

impl<K: Into<String>> FromIterator<K> for MemoryKeyspace {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut keyspace = Self::new();
        for key in iter {
            keyspace.insert(key, "");
        }
        keyspace
    }
}

/// Redis-style glob matching: `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\x`
///
/// On a mismatch only the most recent `*` is retried, one byte further on,
/// which bounds the work by pattern length times text length.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut retry: Option<(usize, usize)> = None;

    while t < text.len() {
        if let Some(&token) = pattern.get(p) {
            if token == b'*' {
                while pattern.get(p) == Some(&b'*') {
                    p += 1;
                }
                retry = Some((p, t));
                continue;
            }
            if let Some(width) = match_one(&pattern[p..], text[t]) {
                p += width;
                t += 1;
                continue;
            }
        }
        match retry {
            Some((star_p, star_t)) => {
                retry = Some((star_p, star_t + 1));
                p = star_p;
                t = star_t + 1;
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&token| token == b'*')
}

/// Pattern bytes consumed when the token at the head of `pattern` matches `ch`
fn match_one(pattern: &[u8], ch: u8) -> Option<usize> {
    match pattern {
        [b'?', ..] => Some(1),
        [b'\\', escaped, ..] => (*escaped == ch).then_some(2),
        [b'[', class @ ..] => match class_end(class) {
            Some(end) => class_match(&class[..end], ch).then_some(end + 2),
            None => (ch == b'[').then_some(1),
        },
        [token, ..] => (*token == ch).then_some(1),
        [] => None,
    }
}

fn class_end(class: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < class.len() {
        match class[i] {
            b'\\' => i += 2,
            b']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn class_match(class: &[u8], ch: u8) -> bool {
    let (negate, class) = match class {
        [b'^', rest @ ..] => (true, rest),
        _ => (false, class),
    };

    let mut matched = false;
    let mut i = 0;
    while i < class.len() {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == ch;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&ch);
            i += 3;
        } else {
            matched |= class[i] == ch;
            i += 1;
        }
    }

    matched != negate
}
