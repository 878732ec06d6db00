//! Response transformer.
//!
//! Applies an [`EffectiveConfiguration`] to a draft reply in a fixed order:
//!
//! 1. vocabulary simplification
//! 2. concept avoidance
//! 3. content filtering
//! 4. style adaptation
//! 5. length enforcement
//!
//! The order matters. Filtering sees the simplified words, and the length
//! limit is enforced last, on the text that will actually be spoken.
//! A pass that finds nothing to do leaves the text byte-identical and adds
//! no modification entry.

pub mod concepts;
pub mod filter;
pub mod length;
pub mod sentences;
pub mod style;
pub mod vocabulary;
mod words;

pub use concepts::FALLBACK_SENTENCE;
pub use filter::REDACTION_MARKER;
pub use length::ELLIPSIS;

use hearth_core::EffectiveConfiguration;
use serde::Serialize;
use tracing::debug;

/// The transformed reply and what was done to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub text: String,
    /// One human-readable entry per change, in pass order.
    pub modifications: Vec<String>,
    /// Whether the length pass cut the text.
    pub truncated: bool,
    pub word_count: usize,
}

/// Transform `text` according to `config`.
pub fn transform(text: &str, config: &EffectiveConfiguration) -> TransformResult {
    let mut modifications = Vec::new();
    let mut current = text.to_string();

    if let Some(out) = vocabulary::simplify(&current, config.vocabulary_level, &mut modifications) {
        debug!(level = %config.vocabulary_level, "Vocabulary simplified");
        current = out;
    }

    let avoided: Vec<&str> = config
        .avoid_concepts
        .iter()
        .chain(config.blocked_topics.iter())
        .map(String::as_str)
        .collect();
    if let Some(out) = concepts::avoid(&current, &avoided, &mut modifications) {
        debug!("Sentences dropped for avoided concepts");
        current = out;
    }

    if let Some(out) = filter::filter(
        &current,
        &config.content_restrictions,
        &config.word_replacements,
        &mut modifications,
    ) {
        debug!("Content filtered");
        current = out;
    }

    if let Some(out) = style::adapt(&current, config.response_style, &mut modifications) {
        debug!(style = %config.response_style, "Style adapted");
        current = out;
    }

    if current.trim().is_empty() && !text.trim().is_empty() {
        modifications.push("empty result replaced with fallback".into());
        current = FALLBACK_SENTENCE.to_string();
    }

    let mut truncated = false;
    let before = length::word_count(&current);
    if let Some(out) = length::enforce(&current, config.max_response_length) {
        modifications.push(format!(
            "truncated from {before} to {} words",
            length::word_count(&out)
        ));
        debug!(max = config.max_response_length, before, "Reply truncated");
        truncated = true;
        current = out;
    }

    TransformResult {
        word_count: length::word_count(&current),
        text: current,
        modifications,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{ResponseStyle, VocabularyLevel};

    fn config() -> EffectiveConfiguration {
        EffectiveConfiguration::default()
    }

    #[test]
    fn defaults_leave_text_alone() {
        let text = "The kitchen lights are on. Dinner is at six.";
        let result = transform(text, &config());
        assert_eq!(result.text, text);
        assert!(result.modifications.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.word_count, 9);
    }

    #[test]
    fn passes_run_in_order() {
        let mut cfg = config();
        cfg.vocabulary_level = VocabularyLevel::Simple;
        cfg.avoid_concepts = vec!["spiders".into()];
        cfg.content_restrictions.insert("scary_content".into());
        cfg.response_style = ResponseStyle::Playful;
        let result = transform(
            "I will illuminate the porch. Spiders live there. The monster movie starts soon.",
            &cfg,
        );
        assert_eq!(result.text, "I will turn on the porch! The creature movie starts soon.");
        assert_eq!(
            result.modifications,
            [
                "simplified 'illuminate' → 'turn on'",
                "removed sentence mentioning 'spiders'",
                "replaced 'monster' → 'creature'",
                "ended first sentence with '!' for playful style",
            ]
        );
    }

    #[test]
    fn blocked_topics_drop_sentences() {
        let mut cfg = config();
        cfg.blocked_topics.insert("politics".into());
        let result = transform("Politics is heated today. The sun is out.", &cfg);
        assert_eq!(result.text, "The sun is out.");
    }

    #[test]
    fn truncation_reported() {
        let mut cfg = config();
        cfg.max_response_length = 3;
        let result = transform("one two three four five", &cfg);
        assert_eq!(result.text, "one two three...");
        assert!(result.truncated);
        assert_eq!(result.word_count, 3);
        assert_eq!(result.modifications, ["truncated from 5 to 3 words"]);
    }

    #[test]
    fn brief_style_empty_result_falls_back() {
        let mut cfg = config();
        cfg.response_style = ResponseStyle::Brief;
        let result = transform("Really, honestly", &cfg);
        assert_eq!(result.text, FALLBACK_SENTENCE);
    }

    #[test]
    fn serializes_to_json() {
        let result = transform("Hi.", &config());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["text"], "Hi.");
        assert_eq!(json["truncated"], false);
    }
}
