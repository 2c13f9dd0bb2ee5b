//! Longest-match string replacement.

use regex::{Captures, Regex, RegexBuilder};
use rustc_hash::FxHashMap;

/// Replaces every occurrence of a key with its value, preferring the longest
/// key at each position. Text no key matches is kept.
#[derive(Debug, Clone, Default)]
pub struct ReplaceTable {
    entries: FxHashMap<String, String>,
    /// Alternation of all keys, longest first. `None` when empty.
    pattern: Option<Regex>,
}

impl ReplaceTable {
    /// Build a table. Empty keys are dropped.
    pub fn new(mut entries: FxHashMap<String, String>) -> Result<Self, regex::Error> {
        entries.retain(|key, _| !key.is_empty());
        if entries.is_empty() {
            return Ok(Self::default());
        }

        let mut keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        keys.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys
            .iter()
            .map(|key| regex::escape(key))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .size_limit(64 << 20)
            .build()?;

        Ok(Self {
            entries,
            pattern: Some(pattern),
        })
    }

    /// Parse a JSON object of string pairs.
    pub fn parse_json(text: &str) -> serde_json::Result<FxHashMap<String, String>> {
        serde_json::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures<'_>| {
                self.entries.get(&caps[0]).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}
