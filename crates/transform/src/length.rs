//! Word-limit enforcement.

use crate::sentences::{is_terminated, spans};

/// Appended when a cut could not end on a sentence boundary.
pub const ELLIPSIS: &str = "...";

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Byte offset just past the `n`th word, or `None` if there are no more
/// than `n` words.
fn end_of_word(text: &str, n: usize) -> Option<usize> {
    let mut words = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == n {
                return Some(text[..i].trim_end().len());
            }
            in_word = true;
            words += 1;
        }
    }
    None
}

/// Cut `text` to at most `max_words` words.
///
/// The cut prefers the last sentence ending in the back half of the kept
/// text; otherwise the kept words get an ellipsis. Returns `None` when the
/// text already fits.
pub fn enforce(text: &str, max_words: usize) -> Option<String> {
    let max_words = max_words.max(1);
    let cut = end_of_word(text, max_words)?;
    let kept = text[..cut].trim_start();

    let last_end = spans(kept)
        .into_iter()
        .map(|sentence| sentence.end)
        .rfind(|&end| is_terminated(&kept[..end]));
    if let Some(end) = last_end
        && end > kept.len() / 2
    {
        return Some(kept[..end].to_string());
    }

    let body = kept
        .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '-' | '—') || c.is_whitespace());
    let body = if body.is_empty() { kept } else { body };
    Some(format!("{body}{ELLIPSIS}"))
}
