//! Content filtering by restriction category.

use crate::words::WordTable;
use regex_lite::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::debug;

/// Replaces masked content.
pub const REDACTION_MARKER: &str = "[filtered]";

struct Category {
    name: &'static str,
    masks: Vec<Regex>,
    replacements: Option<WordTable>,
}

fn category(
    name: &'static str,
    masks: &[&str],
    replacements: &[(&'static str, &'static str)],
) -> Category {
    Category {
        name,
        masks: masks
            .iter()
            .map(|m| Regex::new(&format!(r"(?i)\b(?:{m})\b")).expect("hardcoded regex"))
            .collect(),
        replacements: WordTable::new(replacements.iter().copied()),
    }
}

static CATEGORIES: LazyLock<Vec<Category>> = LazyLock::new(|| {
    vec![
        category(
            "profanity",
            &[
                r"damn(?:ed|it)?",
                r"hell",
                r"crap(?:py)?",
                r"shit\w*",
                r"fuck\w*",
                r"bitch\w*",
                r"bastards?",
                r"ass(?:hole)?s?",
            ],
            &[("stupid", "silly"), ("idiot", "silly goose"), ("shut up", "be quiet")],
        ),
        category(
            "violence",
            &[
                r"kill(?:s|ed|ing|er)?",
                r"murder\w*",
                r"stab(?:s|bed|bing)?",
                r"shoot(?:s|ing)?",
                r"blood(?:y|shed)?",
                r"guns?",
                r"weapons?",
            ],
            &[
                ("fight", "argument"),
                ("fighting", "arguing"),
                ("war", "conflict"),
                ("attack", "approach"),
            ],
        ),
        category(
            "mature_themes",
            &[
                r"sex\w*",
                r"nude\w*",
                r"drugs?",
                r"drunk",
                r"gambl\w*",
                r"suicid\w*",
            ],
            &[("beer", "drink"), ("wine", "drink"), ("alcohol", "grown-up drinks")],
        ),
        category(
            "scary_content",
            &[r"gor(?:e|y)", r"corpses?", r"demons?", r"horror\w*"],
            &[
                ("monster", "creature"),
                ("monsters", "creatures"),
                ("ghost", "friendly spirit"),
                ("nightmare", "bad dream"),
                ("scary", "surprising"),
                ("terrifying", "surprising"),
            ],
        ),
    ]
});

/// Apply each restricted category, then the configured word replacements.
/// Returns `None` when nothing changed.
pub fn filter(
    text: &str,
    restrictions: &BTreeSet<String>,
    word_replacements: &BTreeMap<String, String>,
    modifications: &mut Vec<String>,
) -> Option<String> {
    let mut current = text.to_string();
    let mut changed = false;

    for name in restrictions {
        let Some(cat) = CATEGORIES.iter().find(|c| c.name == name.as_str()) else {
            debug!(category = %name, "Unknown content category ignored");
            continue;
        };

        let mut masked = 0;
        for mask in &cat.masks {
            let count = mask.find_iter(&current).count();
            if count > 0 {
                masked += count;
                current = mask.replace_all(&current, REDACTION_MARKER).into_owned();
            }
        }
        if masked > 0 {
            changed = true;
            let noun = if masked == 1 { "term" } else { "terms" };
            modifications.push(format!("masked {masked} {} {noun}", cat.name));
        }

        if let Some((out, applied)) = cat.replacements.as_ref().and_then(|t| t.apply(&current)) {
            changed = true;
            current = out;
            record(&applied, modifications);
        }
    }

    if let Some((out, applied)) =
        WordTable::new(word_replacements.iter()).and_then(|t| t.apply(&current))
    {
        changed = true;
        current = out;
        record(&applied, modifications);
    }

    changed.then_some(current)
}

fn record(applied: &[(String, String)], modifications: &mut Vec<String>) {
    modifications.extend(
        applied
            .iter()
            .map(|(from, to)| format!("replaced '{from}' → '{to}'")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_restrictions_no_change() {
        let mut mods = Vec::new();
        assert!(filter("What the hell.", &set(&[]), &BTreeMap::new(), &mut mods).is_none());
        assert!(mods.is_empty());
    }

    #[test]
    fn masks_profanity() {
        let mut mods = Vec::new();
        let out = filter(
            "Well damn, that is a crappy hello.",
            &set(&["profanity"]),
            &BTreeMap::new(),
            &mut mods,
        )
        .unwrap();
        assert_eq!(out, "Well [filtered], that is a [filtered] hello.");
        assert_eq!(mods, ["masked 2 profanity terms"]);
    }

    #[test]
    fn replaces_category_words() {
        let mut mods = Vec::new();
        let out = filter(
            "The monster story is scary.",
            &set(&["scary_content"]),
            &BTreeMap::new(),
            &mut mods,
        )
        .unwrap();
        assert_eq!(out, "The creature story is surprising.");
        assert_eq!(mods.len(), 2);
    }

    #[test]
    fn word_replacements_apply_last() {
        let mut replacements = BTreeMap::new();
        replacements.insert("argument".to_string(), "disagreement".to_string());
        let mut mods = Vec::new();
        let out = filter("They had a fight.", &set(&["violence"]), &replacements, &mut mods).unwrap();
        assert_eq!(out, "They had a disagreement.");
        assert_eq!(
            mods,
            ["replaced 'fight' → 'argument'", "replaced 'argument' → 'disagreement'"]
        );
    }

    #[test]
    fn unknown_category_ignored() {
        let mut mods = Vec::new();
        assert!(filter("Hello.", &set(&["spoilers"]), &BTreeMap::new(), &mut mods).is_none());
    }

    #[test]
    fn innocent_words_survive() {
        let mut mods = Vec::new();
        let clean = "Hello, I assessed the shell and the classic skill set.";
        let all = set(&["profanity", "violence", "mature_themes", "scary_content"]);
        assert!(filter(clean, &all, &BTreeMap::new(), &mut mods).is_none());
    }
}
