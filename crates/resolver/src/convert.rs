//! Conversion of a merged fragment into a typed [`EffectiveConfiguration`].
//!
//! Missing keys take the system default. A value of the wrong shape, or an
//! enumerated value outside its allowed set, takes the field's restrictive
//! value and is recorded in the trace.

use hearth_core::{
    CONTENT_CATEGORIES, EffectiveConfiguration, Fragment, InterruptionThreshold, MemoryAccess,
    NotificationMode, Permissions, ProactiveFrequency, RejectedValue, ResolutionTrace,
    ResponseStyle, SettingEnum, SettingValue, VocabularyLevel, VoiceVolume,
    profile::{DEFAULT_MAX_RESPONSE_LENGTH, RESTRICTIVE_MAX_RESPONSE_LENGTH},
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Build the typed configuration. Rejections are appended to `trace`.
pub fn to_effective(fragment: &Fragment, trace: &mut ResolutionTrace) -> EffectiveConfiguration {
    let mut c = Converter {
        fragment,
        rejected: Vec::new(),
    };

    let config = EffectiveConfiguration {
        response_style: c.enumerated::<ResponseStyle>(),
        vocabulary_level: c.enumerated::<VocabularyLevel>(),
        max_response_length: c.max_response_length(),
        content_restrictions: c.content_restrictions(),
        blocked_topics: c.list("blocked_topics").into_iter().collect(),
        proactive_suggestions: c.flag("proactive_suggestions", true),
        proactive_frequency: c.enumerated::<ProactiveFrequency>(),
        interruption_threshold: c.enumerated::<InterruptionThreshold>(),
        voice_responses: c.flag("voice_responses", true),
        voice_volume: c.enumerated::<VoiceVolume>(),
        voice: c.text("voice"),
        notifications: c.enumerated::<NotificationMode>(),
        model: c.text("model"),
        memory: c.memory(),
        permissions: c.permissions(),
        preferred_vocabulary: c.list("preferred_vocabulary"),
        avoid_concepts: c.list("avoid_concepts"),
        word_replacements: c.word_replacements(),
        interests: c.list("interests"),
        trace: ResolutionTrace::default(),
    };

    trace.rejected_values.append(&mut c.rejected);
    config
}

struct Converter<'a> {
    fragment: &'a Fragment,
    rejected: Vec<RejectedValue>,
}

impl Converter<'_> {
    fn reject(&mut self, field: &str, value: &SettingValue, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(field, value = %value.display(), reason = %reason, "Rejected setting value; using restrictive default");
        self.rejected.push(RejectedValue {
            field: field.to_string(),
            value: value.display(),
            reason,
        });
    }

    fn enumerated<T: SettingEnum>(&mut self) -> T {
        let fragment = self.fragment;
        let Some(value) = fragment.get(T::KEY) else {
            return T::system_default();
        };
        match value {
            SettingValue::Str(s) => match T::parse(s) {
                Ok(v) => v,
                Err(e) => {
                    self.reject(T::KEY, value, e.to_string());
                    T::restrictive()
                }
            },
            other => {
                self.reject(T::KEY, other, format!("expected string, found {}", other.kind()));
                T::restrictive()
            }
        }
    }

    fn max_response_length(&mut self) -> usize {
        const KEY: &str = "max_response_length";
        let fragment = self.fragment;
        let Some(value) = fragment.get(KEY) else {
            return DEFAULT_MAX_RESPONSE_LENGTH;
        };
        match value.as_int() {
            Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
            Some(_) => {
                self.reject(KEY, value, "must be at least 1");
                1
            }
            None => {
                self.reject(KEY, value, format!("expected integer, found {}", value.kind()));
                RESTRICTIVE_MAX_RESPONSE_LENGTH
            }
        }
    }

    fn content_restrictions(&mut self) -> BTreeSet<String> {
        const KEY: &str = "content_restrictions";
        let fragment = self.fragment;
        match fragment.get(KEY) {
            None => BTreeSet::new(),
            Some(SettingValue::List(items)) => items.iter().cloned().collect(),
            Some(other) => {
                self.reject(KEY, other, format!("expected list, found {}", other.kind()));
                CONTENT_CATEGORIES.iter().map(|c| c.to_string()).collect()
            }
        }
    }

    fn flag(&mut self, key: &str, default: bool) -> bool {
        self.flag_in(self.fragment, key, key, default)
    }

    /// Booleans fail closed to `false`.
    fn flag_in(&mut self, table: &Fragment, key: &str, field: &str, default: bool) -> bool {
        match table.get(key) {
            None => default,
            Some(SettingValue::Bool(b)) => *b,
            Some(other) => {
                self.reject(field, other, format!("expected boolean, found {}", other.kind()));
                false
            }
        }
    }

    fn text(&mut self, key: &str) -> String {
        let fragment = self.fragment;
        match fragment.get(key) {
            None => "default".into(),
            Some(SettingValue::Str(s)) => s.clone(),
            Some(other) => {
                self.reject(key, other, format!("expected string, found {}", other.kind()));
                "default".into()
            }
        }
    }

    fn list(&mut self, key: &str) -> Vec<String> {
        self.list_in(self.fragment, key, key).unwrap_or_default()
    }

    /// `None` when absent; an empty list when rejected.
    fn list_in(&mut self, table: &Fragment, key: &str, field: &str) -> Option<Vec<String>> {
        match table.get(key)? {
            SettingValue::List(items) => Some(items.clone()),
            other => {
                self.reject(field, other, format!("expected list, found {}", other.kind()));
                Some(Vec::new())
            }
        }
    }

    fn memory(&mut self) -> MemoryAccess {
        const KEY: &str = "memory";
        let fragment = self.fragment;
        match fragment.get(KEY) {
            None => MemoryAccess {
                include_personal: true,
                include_shared: true,
            },
            Some(SettingValue::Table(table)) => MemoryAccess {
                include_personal: self.flag_in(table, "include_personal", "memory.include_personal", true),
                include_shared: self.flag_in(table, "include_shared", "memory.include_shared", true),
            },
            Some(other) => {
                self.reject(KEY, other, format!("expected table, found {}", other.kind()));
                MemoryAccess {
                    include_personal: false,
                    include_shared: false,
                }
            }
        }
    }

    fn permissions(&mut self) -> Permissions {
        const KEY: &str = "permissions";
        let fragment = self.fragment;
        let defaults = EffectiveConfiguration::default().permissions;
        match fragment.get(KEY) {
            None => defaults,
            Some(SettingValue::Table(table)) => Permissions {
                allowed: self
                    .list_in(table, "allowed", "permissions.allowed")
                    .unwrap_or(defaults.allowed),
                denied: self
                    .list_in(table, "denied", "permissions.denied")
                    .unwrap_or(defaults.denied),
            },
            Some(other) => {
                self.reject(KEY, other, format!("expected table, found {}", other.kind()));
                EffectiveConfiguration::restrictive().permissions
            }
        }
    }

    fn word_replacements(&mut self) -> BTreeMap<String, String> {
        const KEY: &str = "word_replacements";
        let fragment = self.fragment;
        let mut out = BTreeMap::new();
        match fragment.get(KEY) {
            None => {}
            Some(SettingValue::Table(table)) => {
                for (word, replacement) in table.iter() {
                    match replacement {
                        SettingValue::Str(r) => {
                            out.insert(word.clone(), r.clone());
                        }
                        other => self.reject(
                            &format!("{KEY}.{word}"),
                            other,
                            format!("expected string, found {}", other.kind()),
                        ),
                    }
                }
            }
            Some(other) => {
                self.reject(KEY, other, format!("expected table, found {}", other.kind()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(value: serde_json::Value) -> (EffectiveConfiguration, ResolutionTrace) {
        let fragment: Fragment = serde_json::from_value(value).unwrap();
        let mut trace = ResolutionTrace::default();
        let config = to_effective(&fragment, &mut trace);
        (config, trace)
    }

    #[test]
    fn empty_fragment_gives_defaults() {
        let (config, trace) = convert(json!({}));
        assert_eq!(config, EffectiveConfiguration::default());
        assert!(trace.rejected_values.is_empty());
    }

    #[test]
    fn typed_fields() {
        let (config, trace) = convert(json!({
            "response_style": "playful",
            "vocabulary_level": "toddler",
            "max_response_length": 30,
            "content_restrictions": ["profanity"],
            "notifications": "none",
            "memory": {"include_shared": false},
            "permissions": {"denied": ["lock.*"]},
            "word_replacements": {"scary": "surprising"},
            "interests": ["trains"],
        }));
        assert!(trace.rejected_values.is_empty());
        assert_eq!(config.response_style, ResponseStyle::Playful);
        assert_eq!(config.vocabulary_level, VocabularyLevel::Toddler);
        assert_eq!(config.max_response_length, 30);
        assert!(config.content_restrictions.contains("profanity"));
        assert_eq!(config.notifications, NotificationMode::Silent);
        assert!(config.memory.include_personal);
        assert!(!config.memory.include_shared);
        assert_eq!(config.permissions.allowed, ["*"]);
        assert!(!config.is_action_allowed("lock.front_door"));
        assert!(config.is_action_allowed("music.play"));
        assert_eq!(config.word_replacements["scary"], "surprising");
        assert_eq!(config.interests, ["trains"]);
    }

    #[test]
    fn unknown_enum_fails_closed() {
        let (config, trace) = convert(json!({
            "vocabulary_level": "baby",
            "voice_volume": 3,
        }));
        assert_eq!(config.vocabulary_level, VocabularyLevel::Toddler);
        assert_eq!(config.voice_volume, VoiceVolume::Quiet);
        let fields: Vec<_> = trace.rejected_values.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, ["vocabulary_level", "voice_volume"]);
        assert_eq!(trace.rejected_values[0].value, "baby");
    }

    #[test]
    fn bad_shapes_fail_closed() {
        let (config, trace) = convert(json!({
            "content_restrictions": "all",
            "proactive_suggestions": "yes",
            "memory": {"include_personal": "sometimes"},
            "permissions": ["everything"],
            "max_response_length": "long",
        }));
        assert_eq!(config.content_restrictions.len(), CONTENT_CATEGORIES.len());
        assert!(!config.proactive_suggestions);
        assert!(!config.memory.include_personal);
        assert!(config.memory.include_shared);
        assert!(!config.is_action_allowed("music.play"));
        assert_eq!(config.max_response_length, RESTRICTIVE_MAX_RESPONSE_LENGTH);
        assert_eq!(trace.rejected_values.len(), 5);
    }

    #[test]
    fn length_clamped_to_one() {
        let (config, trace) = convert(json!({"max_response_length": 0}));
        assert_eq!(config.max_response_length, 1);
        assert_eq!(trace.rejected_values.len(), 1);
    }

    #[test]
    fn non_string_replacement_dropped() {
        let (config, trace) = convert(json!({
            "word_replacements": {"good": "great", "bad": 1},
        }));
        assert_eq!(config.word_replacements.len(), 1);
        assert_eq!(trace.rejected_values[0].field, "word_replacements.bad");
    }
}
