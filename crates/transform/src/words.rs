//! Whole-word, case-insensitive substitution tables.

use regex_lite::{Captures, Regex};
use std::collections::BTreeMap;
use tracing::warn;

/// A set of word (or short phrase) replacements compiled into one
/// alternation, so every match is replaced in a single pass and
/// replacements never chain.
#[derive(Debug)]
pub(crate) struct WordTable {
    regex: Regex,
    map: BTreeMap<String, String>,
}

impl WordTable {
    /// Returns `None` for an empty table.
    pub(crate) fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Option<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let map: BTreeMap<String, String> = pairs
            .into_iter()
            .filter(|(k, _)| !k.as_ref().trim().is_empty())
            .map(|(k, v)| (normalize(k.as_ref().trim()), v.into()))
            .collect();
        if map.is_empty() {
            return None;
        }

        // Longest first so phrases win over their own first word.
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys
            .iter()
            .map(|k| regex_lite::escape(k).replace('\'', "['’]"))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&format!(r"(?i)\b(?:{alternation})\b")) {
            Ok(regex) => Some(Self { regex, map }),
            Err(e) => {
                warn!(error = %e, "Could not compile word table; skipping it");
                None
            }
        }
    }

    /// Replace every listed word in `text`.
    ///
    /// Returns `None` when nothing matched. Otherwise returns the new text
    /// and the distinct `(word, replacement)` pairs that were applied, in
    /// order of first appearance.
    pub(crate) fn apply(&self, text: &str) -> Option<(String, Vec<(String, String)>)> {
        if !self.regex.is_match(text) {
            return None;
        }
        let mut applied: Vec<(String, String)> = Vec::new();
        let out = self.regex.replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            let key = normalize(matched);
            let Some(replacement) = self.map.get(&key) else {
                return matched.to_string();
            };
            if !applied.iter().any(|(k, _)| *k == key) {
                applied.push((key, replacement.clone()));
            }
            match_case(matched, replacement)
        });
        Some((out.into_owned(), applied))
    }
}

fn normalize(word: &str) -> String {
    word.to_lowercase().replace('’', "'")
}

/// Carry the matched word's capitalization over to its replacement.
pub(crate) fn match_case(matched: &str, replacement: &str) -> String {
    let letters: Vec<char> = matched.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }
    if matched.chars().next().is_some_and(char::is_uppercase) {
        return capitalize(replacement);
    }
    replacement.to_string()
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
