//! Concept avoidance: drop whole sentences that mention an avoided concept.

use crate::sentences;
use regex_lite::Regex;
use tracing::warn;

/// Used when every sentence was dropped.
pub const FALLBACK_SENTENCE: &str = "Let's talk about something else.";

/// Remove sentences matching any of `concepts`, case-insensitively and on
/// word boundaries. Returns `None` when nothing was dropped.
pub fn avoid<S: AsRef<str>>(
    text: &str,
    concepts: &[S],
    modifications: &mut Vec<String>,
) -> Option<String> {
    let patterns: Vec<(&str, Regex)> = concepts
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .filter_map(|c| {
            match Regex::new(&format!(r"(?i)\b{}\b", regex_lite::escape(c))) {
                Ok(re) => Some((c, re)),
                Err(e) => {
                    warn!(concept = %c, error = %e, "Could not compile avoided concept");
                    None
                }
            }
        })
        .collect();
    if patterns.is_empty() {
        return None;
    }

    let spans = sentences::spans(text);
    let mut out = String::new();
    // Gaps skipped over since the last kept sentence.
    let mut gaps: Vec<&str> = Vec::new();
    let mut dropped = 0;
    for (i, span) in spans.iter().enumerate() {
        let sentence = &text[span.clone()];
        if i > 0 {
            gaps.push(&text[spans[i - 1].end..span.start]);
        }
        match patterns.iter().find(|(_, re)| re.is_match(sentence)) {
            Some((concept, _)) => {
                dropped += 1;
                modifications.push(format!("removed sentence mentioning '{concept}'"));
            }
            None => {
                if !out.is_empty() {
                    out.push_str(widest_gap(&gaps));
                }
                gaps.clear();
                out.push_str(sentence);
            }
        }
    }
    if dropped == 0 {
        return None;
    }
    if out.is_empty() {
        modifications.push("all sentences removed; used fallback".into());
        return Some(FALLBACK_SENTENCE.to_string());
    }
    Some(out)
}

/// The gap with the most line breaks, so paragraph breaks survive a removal.
fn widest_gap<'a>(gaps: &[&'a str]) -> &'a str {
    gaps.iter()
        .copied()
        .rev()
        .max_by_key(|gap| gap.matches('\n').count())
        .unwrap_or(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_matching_sentences() {
        let mut mods = Vec::new();
        let out = avoid(
            "The weather is nice. Spiders are outside. Have a good day!",
            &["spiders"],
            &mut mods,
        )
        .unwrap();
        assert_eq!(out, "The weather is nice. Have a good day!");
        assert_eq!(mods, ["removed sentence mentioning 'spiders'"]);
    }

    #[test]
    fn keeps_line_breaks_between_survivors() {
        let mut mods = Vec::new();
        let out = avoid(
            "First point.\nSpiders are here.\nLast point.",
            &["spiders"],
            &mut mods,
        )
        .unwrap();
        assert_eq!(out, "First point.\nLast point.");

        let out = avoid(
            "Intro. Spiders again.\n\nNew paragraph. More text.",
            &["spiders"],
            &mut mods,
        )
        .unwrap();
        assert_eq!(out, "Intro.\n\nNew paragraph. More text.");
    }

    #[test]
    fn matches_whole_words_case_insensitively() {
        let mut mods = Vec::new();
        assert!(avoid("It is warm today.", &["war"], &mut mods).is_none());
        let out = avoid("It is warm. The WAR ended.", &["war"], &mut mods).unwrap();
        assert_eq!(out, "It is warm.");
    }

    #[test]
    fn everything_dropped_uses_fallback() {
        let mut mods = Vec::new();
        let out = avoid("Storms are coming. Storms are loud.", &["storms"], &mut mods).unwrap();
        assert_eq!(out, FALLBACK_SENTENCE);
        assert_eq!(mods.len(), 3);
    }

    #[test]
    fn blank_concepts_ignored() {
        let mut mods = Vec::new();
        assert!(avoid("Anything goes.", &["", "  "], &mut mods).is_none());
        assert!(avoid::<&str>("Anything goes.", &[], &mut mods).is_none());
    }
}
