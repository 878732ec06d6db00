//! Style adaptation.

use crate::sentences;
use crate::words::{WordTable, capitalize};
use hearth_core::ResponseStyle;
use regex_lite::Regex;
use std::sync::LazyLock;

static FILLERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:basically|actually|literally|honestly|really|just|you know|i mean|kind of|sort of)\b,?",
    )
    .expect("hardcoded regex")
});

static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("hardcoded regex"));

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+([,.!?;:])").expect("hardcoded regex"));

static DANGLING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",+[ \t]*([.!?])").expect("hardcoded regex"));

static CONTRACTIONS: LazyLock<Option<WordTable>> = LazyLock::new(|| {
    WordTable::new([
        ("aren't", "are not"),
        ("can't", "cannot"),
        ("couldn't", "could not"),
        ("didn't", "did not"),
        ("doesn't", "does not"),
        ("don't", "do not"),
        ("hasn't", "has not"),
        ("haven't", "have not"),
        ("i'll", "I will"),
        ("i'm", "I am"),
        ("i've", "I have"),
        ("isn't", "is not"),
        ("it's", "it is"),
        ("let's", "let us"),
        ("shouldn't", "should not"),
        ("that's", "that is"),
        ("there's", "there is"),
        ("they're", "they are"),
        ("wasn't", "was not"),
        ("we're", "we are"),
        ("won't", "will not"),
        ("wouldn't", "would not"),
        ("you'll", "you will"),
        ("you're", "you are"),
        ("you've", "you have"),
        ("what's", "what is"),
    ])
});

/// Adapt `text` to `style`. Returns `None` when nothing changed.
pub fn adapt(text: &str, style: ResponseStyle, modifications: &mut Vec<String>) -> Option<String> {
    match style {
        ResponseStyle::Brief => {
            let (out, removed) = strip_fillers(text)?;
            let noun = if removed == 1 { "word" } else { "words" };
            modifications.push(format!("removed {removed} filler {noun} for brief style"));
            Some(out)
        }
        ResponseStyle::Playful => {
            let out = exclaim_first_sentence(text)?;
            modifications.push("ended first sentence with '!' for playful style".into());
            Some(out)
        }
        ResponseStyle::Formal => {
            let (out, applied) = CONTRACTIONS.as_ref()?.apply(text)?;
            modifications.extend(
                applied
                    .into_iter()
                    .map(|(from, to)| format!("expanded '{from}' → '{to}'")),
            );
            Some(out)
        }
        ResponseStyle::Conversational | ResponseStyle::Detailed => None,
    }
}

/// Remove filler words and tidy the spacing they leave behind. A filler
/// that opened a sentence hands its capital letter to the next word.
fn strip_fillers(text: &str) -> Option<(String, usize)> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut removed = 0;
    let mut recapitalize = false;

    for m in FILLERS.find_iter(text) {
        push_segment(&mut out, &text[last..m.start()], &mut recapitalize);
        let opens_sentence = out
            .trim_end()
            .chars()
            .last()
            .is_none_or(sentences::is_terminator);
        if opens_sentence && m.as_str().starts_with(char::is_uppercase) {
            recapitalize = true;
        }
        last = m.end();
        removed += 1;
    }
    if removed == 0 {
        return None;
    }
    push_segment(&mut out, &text[last..], &mut recapitalize);

    let out = SPACE_RUNS.replace_all(&out, " ");
    let out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
    let out = DANGLING_COMMA.replace_all(&out, "$1");
    let out = out.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    Some((out.trim().to_string(), removed))
}

/// Append `segment`, capitalizing its first word when asked to.
fn push_segment(out: &mut String, segment: &str, recapitalize: &mut bool) {
    if !*recapitalize {
        out.push_str(segment);
        return;
    }
    match segment.find(|c: char| !c.is_whitespace()) {
        Some(i) => {
            out.push_str(&segment[..i]);
            out.push_str(&capitalize(&segment[i..]));
            *recapitalize = false;
        }
        None => out.push_str(segment),
    }
}

/// Turn the first sentence's closing period into an exclamation mark.
fn exclaim_first_sentence(text: &str) -> Option<String> {
    let first = sentences::spans(text).into_iter().next()?;
    let sentence = &text[first.clone()];
    let trimmed = sentence.trim_end_matches(|c: char| !sentences::is_terminator(c));
    if !trimmed.ends_with('.') || trimmed.ends_with("..") {
        return None;
    }
    let dot = first.start + trimmed.len() - 1;
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..dot]);
    out.push('!');
    out.push_str(&text[dot + 1..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, style: ResponseStyle) -> (Option<String>, Vec<String>) {
        let mut mods = Vec::new();
        let out = adapt(text, style, &mut mods);
        (out, mods)
    }

    #[test]
    fn brief_strips_fillers() {
        let (out, mods) = run(
            "I just think it is really quite nice, you know.",
            ResponseStyle::Brief,
        );
        assert_eq!(out.unwrap(), "I think it is quite nice.");
        assert_eq!(mods, ["removed 3 filler words for brief style"]);
    }

    #[test]
    fn brief_recapitalizes_sentence_start() {
        let (out, _) = run(
            "Basically, the lights are off. Honestly it is late.",
            ResponseStyle::Brief,
        );
        assert_eq!(out.unwrap(), "The lights are off. It is late.");
    }

    #[test]
    fn brief_leaves_clean_text_alone() {
        let (out, mods) = run("The lights are off.", ResponseStyle::Brief);
        assert!(out.is_none());
        assert!(mods.is_empty());
    }

    #[test]
    fn playful_changes_only_first_period() {
        let (out, mods) = run("Good morning. It is sunny. Enjoy.", ResponseStyle::Playful);
        assert_eq!(out.unwrap(), "Good morning! It is sunny. Enjoy.");
        assert_eq!(mods.len(), 1);
    }

    #[test]
    fn playful_skips_questions_and_ellipses() {
        assert!(run("Ready? Let's go.", ResponseStyle::Playful).0.is_none());
        assert!(run("Well... maybe.", ResponseStyle::Playful).0.is_none());
        assert!(run("No punctuation", ResponseStyle::Playful).0.is_none());
    }

    #[test]
    fn formal_expands_contractions() {
        let (out, mods) = run("Don't worry, it's fine and I'm here.", ResponseStyle::Formal);
        assert_eq!(out.unwrap(), "Do not worry, it is fine and I am here.");
        assert_eq!(mods.len(), 3);
    }

    #[test]
    fn conversational_and_detailed_are_noops() {
        let text = "Basically, don't. Really.";
        assert!(run(text, ResponseStyle::Conversational).0.is_none());
        assert!(run(text, ResponseStyle::Detailed).0.is_none());
    }
}
