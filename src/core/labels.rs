//! Label sets and their canonical string form
//!
//! Label keys are sanitized so that only `[A-Za-z0-9_]` remains; every
//! other character becomes `_`. A label set renders as
//! `{key1="value1",key2="value2"}` with keys in ascending order, which makes
//! the string usable as a grouping key for streams.

use super::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape_value(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}

/// Parse a label string and render it back in canonical form.
///
/// Canonicalizing an already canonical string returns it unchanged.
pub fn canonicalize(labels: &str) -> Result<String> {
    Ok(LabelSet::parse(labels)?.canonical())
}

/// Sorted mapping of sanitized label keys to values
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct LabelSet {
    labels: BTreeMap<String, String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label, sanitizing its key.
    ///
    /// Keys that are empty are ignored. When two raw keys sanitize to the
    /// same key, the later insert wins. Collecting from an iterator sorts by
    /// raw key first, so there the greatest raw key wins.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        let key = key.as_ref();
        if key.is_empty() {
            return;
        }
        self.labels.insert(sanitize_key(key), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(&sanitize_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return `base` overlaid with `self`; keys in `self` win.
    #[must_use]
    pub fn merged_over(&self, base: &LabelSet) -> LabelSet {
        if base.is_empty() {
            return self.clone();
        }
        let mut labels = base.labels.clone();
        labels.extend(self.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        LabelSet { labels }
    }

    /// Render as `{k1="v1",k2="v2"}` with keys in ascending order
    pub fn canonical(&self) -> String {
        let mut out = String::with_capacity(2 + self.labels.len() * 16);
        out.push('{');
        for (i, (key, value)) in self.labels.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(key);
            out.push_str("=\"");
            escape_value(value, &mut out);
            out.push('"');
        }
        out.push('}');
        out
    }

    /// Parse a `{k="v",...}` label string.
    ///
    /// Whitespace between pairs is tolerated; keys are sanitized on the way
    /// in, so any parsed string canonicalizes to a sanitized form.
    pub fn parse(input: &str) -> Result<LabelSet> {
        let trimmed = input.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| ClientError::invalid_labels(input, "expected '{...}'"))?;

        let mut set = LabelSet::new();
        let mut chars = inner.chars().peekable();

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            loop {
                match chars.next() {
                    Some('=') => break,
                    Some(c) => key.push(c),
                    None => return Err(ClientError::invalid_labels(input, "missing '='")),
                }
            }
            let key = key.trim();
            if key.is_empty() {
                return Err(ClientError::invalid_labels(input, "empty label key"));
            }

            if chars.next() != Some('"') {
                return Err(ClientError::invalid_labels(input, "label value must be quoted"));
            }

            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some(c @ ('"' | '\\')) => value.push(c),
                        // Unknown escapes stay verbatim
                        Some(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                        None => {
                            return Err(ClientError::invalid_labels(input, "dangling escape"))
                        }
                    },
                    Some(c) => value.push(c),
                    None => {
                        return Err(ClientError::invalid_labels(input, "unterminated value"))
                    }
                }
            }
            set.insert(key, value);

            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            match chars.next() {
                Some(',') | None => {}
                Some(c) => {
                    return Err(ClientError::invalid_labels(
                        input,
                        format!("unexpected character '{}' after value", c),
                    ))
                }
            }
        }

        Ok(set)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<BTreeMap<String, String>> for LabelSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<LabelSet> for BTreeMap<String, String> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}

impl From<&HashMap<String, String>> for LabelSet {
    fn from(map: &HashMap<String, String>) -> Self {
        map.iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<String>, const N: usize> From<[(K, V); N]> for LabelSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs: Vec<(K, V)> = iter.into_iter().collect();
        pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));
        let mut set = LabelSet::new();
        for (k, v) in pairs {
            set.insert(k, v);
        }
        set
    }
}
