//! Terminator-based sentence splitting.

use std::ops::Range;

/// Whether `c` ends a sentence.
pub fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Characters allowed to trail a terminator inside the same sentence.
pub(crate) fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’')
}

/// Byte ranges of each sentence in `text`, trimmed of surrounding
/// whitespace. A sentence ends after a run of `.`, `!` or `?` (plus any
/// closing quotes) followed by whitespace or the end of the text. Trailing
/// text without a terminator is a final sentence.
pub fn spans(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let begin = *start.get_or_insert(i);
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if is_terminator(next) || is_closer(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if at_boundary {
            out.push(begin..end);
            start = None;
        }
    }

    if let Some(begin) = start {
        out.push(begin..text.trim_end().len());
    }
    out
}

/// Whether `sentence` ends on a terminator, ignoring closing quotes.
pub fn is_terminated(sentence: &str) -> bool {
    sentence
        .trim_end_matches(is_closer)
        .ends_with(is_terminator)
}

/// The sentences of `text` as slices.
pub fn split(text: &str) -> Vec<&str> {
    spans(text).into_iter().map(|r| &text[r]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        assert_eq!(
            split("Hello there. How are you? Great!"),
            ["Hello there.", "How are you?", "Great!"]
        );
    }

    #[test]
    fn keeps_runs_and_quotes() {
        assert_eq!(
            split("Wait... what?! She said \"no.\" Fine"),
            ["Wait...", "what?!", "She said \"no.\"", "Fine"]
        );
    }

    #[test]
    fn terminated_sentences() {
        assert!(is_terminated("Done."));
        assert!(is_terminated("She said \"no!\""));
        assert!(!is_terminated("reads 21.5"));
        assert!(!is_terminated("a 'quoted' word"));
    }

    #[test]
    fn decimals_stay_together() {
        assert_eq!(split("It is 3.5 degrees. Cold."), ["It is 3.5 degrees.", "Cold."]);
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(split("   ").is_empty());
        assert!(split("").is_empty());
    }

    #[test]
    fn spans_index_original() {
        let text = "  One.  Two  ";
        let spans = spans(text);
        assert_eq!(&text[spans[0].clone()], "One.");
        assert_eq!(&text[spans[1].clone()], "Two");
    }
}
