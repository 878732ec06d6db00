//! The effective behavior profile and the schema of known settings.
//!
//! Enumerated settings carry three values besides their variants: the
//! system default used when nothing sets them, the restrictive value used
//! when a resolved value fails to parse, and the list of accepted names
//! reported in validation errors.

use crate::error::UnknownEnumValue;
use crate::fragment::SettingValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Common behavior of enumerated settings.
pub trait SettingEnum: Sized + Copy {
    /// Setting key this enum is stored under.
    const KEY: &'static str;
    /// Every accepted spelling, in declaration order.
    const NAMES: &'static [&'static str];

    fn as_str(&self) -> &'static str;
    fn from_name(name: &str) -> Option<Self>;
    /// Value used when no layer sets the key.
    fn system_default() -> Self;
    /// Value used when the resolved value is not one of [`Self::NAMES`].
    fn restrictive() -> Self;

    fn parse(value: &str) -> Result<Self, UnknownEnumValue> {
        Self::from_name(value).ok_or_else(|| UnknownEnumValue {
            field: Self::KEY.into(),
            value: value.into(),
            expected: Self::NAMES.to_vec(),
        })
    }
}

macro_rules! setting_enum {
    (
        $(#[$meta:meta])*
        $name:ident, key = $key:literal,
        default = $default:ident, restrictive = $restrictive:ident,
        { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl SettingEnum for $name {
            const KEY: &'static str = $key;
            const NAMES: &'static [&'static str] = &[$($text),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn system_default() -> Self {
                $name::$default
            }

            fn restrictive() -> Self {
                $name::$restrictive
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

setting_enum!(
    /// How replies are shaped.
    ResponseStyle, key = "response_style",
    default = Conversational, restrictive = Brief,
    {
        Brief => "brief",
        Conversational => "conversational",
        Detailed => "detailed",
        Playful => "playful",
        Formal => "formal",
    }
);

setting_enum!(
    /// Word-choice level, from unrestricted to simplest.
    VocabularyLevel, key = "vocabulary_level",
    default = Adult, restrictive = Toddler,
    {
        Adult => "adult",
        Simple => "simple",
        VerySimple => "very_simple",
        Toddler => "toddler",
    }
);

setting_enum!(
    ProactiveFrequency, key = "proactive_frequency",
    default = Medium, restrictive = Never,
    {
        Never => "never",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

setting_enum!(
    /// Minimum importance an event needs before the assistant may interrupt.
    InterruptionThreshold, key = "interruption_threshold",
    default = Important, restrictive = Never,
    {
        Any => "any",
        Important => "important",
        UrgentOnly => "urgent_only",
        Never => "never",
    }
);

setting_enum!(
    VoiceVolume, key = "voice_volume",
    default = Normal, restrictive = Quiet,
    {
        Whisper => "whisper",
        Quiet => "quiet",
        Normal => "normal",
        Loud => "loud",
    }
);

setting_enum!(
    NotificationMode, key = "notifications",
    default = All, restrictive = VisualOnly,
    {
        All => "all",
        VisualOnly => "visual_only",
        AudioOnly => "audio_only",
        Silent => "none",
    }
);

impl VocabularyLevel {
    /// Levels ordered from least to most restrictive.
    pub const ORDERED: [VocabularyLevel; 4] = [
        VocabularyLevel::Adult,
        VocabularyLevel::Simple,
        VocabularyLevel::VerySimple,
        VocabularyLevel::Toddler,
    ];

    /// Position in [`Self::ORDERED`]; higher is stricter.
    pub fn strictness(&self) -> usize {
        match self {
            VocabularyLevel::Adult => 0,
            VocabularyLevel::Simple => 1,
            VocabularyLevel::VerySimple => 2,
            VocabularyLevel::Toddler => 3,
        }
    }
}

// ── Known settings schema ───────────────────────────────────────────────

/// Shape a known setting key must have.
#[derive(Debug, Clone, Copy)]
pub enum SettingKind {
    Bool,
    /// Integer greater than zero.
    PositiveInt,
    Text,
    List,
    /// One of a fixed set of names.
    Enum(&'static [&'static str]),
    /// Table whose values are all strings.
    StringMap,
    /// Table with its own known keys.
    Table(&'static [(&'static str, SettingKind)]),
}

const MEMORY_SCHEMA: &[(&str, SettingKind)] = &[
    ("include_personal", SettingKind::Bool),
    ("include_shared", SettingKind::Bool),
];

const PERMISSIONS_SCHEMA: &[(&str, SettingKind)] = &[
    ("allowed", SettingKind::List),
    ("denied", SettingKind::List),
];

/// Every setting key the Effective Configuration reads.
pub const SETTINGS_SCHEMA: &[(&str, SettingKind)] = &[
    ("response_style", SettingKind::Enum(ResponseStyle::NAMES)),
    ("vocabulary_level", SettingKind::Enum(VocabularyLevel::NAMES)),
    ("max_response_length", SettingKind::PositiveInt),
    ("content_restrictions", SettingKind::List),
    ("blocked_topics", SettingKind::List),
    ("proactive_suggestions", SettingKind::Bool),
    ("proactive_frequency", SettingKind::Enum(ProactiveFrequency::NAMES)),
    ("interruption_threshold", SettingKind::Enum(InterruptionThreshold::NAMES)),
    ("voice_responses", SettingKind::Bool),
    ("voice_volume", SettingKind::Enum(VoiceVolume::NAMES)),
    ("voice", SettingKind::Text),
    ("notifications", SettingKind::Enum(NotificationMode::NAMES)),
    ("model", SettingKind::Text),
    ("memory", SettingKind::Table(MEMORY_SCHEMA)),
    ("permissions", SettingKind::Table(PERMISSIONS_SCHEMA)),
    ("preferred_vocabulary", SettingKind::List),
    ("avoid_concepts", SettingKind::List),
    ("word_replacements", SettingKind::StringMap),
    ("interests", SettingKind::List),
];

/// Find the schema entry for a top-level key.
pub fn setting_kind(key: &str) -> Option<SettingKind> {
    SETTINGS_SCHEMA
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
}

impl SettingKind {
    /// Check a value against this kind. `Unset` is always accepted.
    ///
    /// On failure returns the offending sub-path (empty for the value
    /// itself) and a reason.
    pub fn check(&self, value: &SettingValue) -> Result<(), (String, String)> {
        if matches!(value, SettingValue::Unset) {
            return Ok(());
        }
        let mismatch = |expected: &str| {
            Err((
                String::new(),
                format!("expected {expected}, found {}", value.kind()),
            ))
        };
        match self {
            SettingKind::Bool => match value {
                SettingValue::Bool(_) => Ok(()),
                _ => mismatch("boolean"),
            },
            SettingKind::PositiveInt => match value.as_int() {
                Some(n) if n >= 1 => Ok(()),
                Some(n) => Err((String::new(), format!("must be at least 1, found {n}"))),
                None => mismatch("integer"),
            },
            SettingKind::Text => match value {
                SettingValue::Str(_) => Ok(()),
                _ => mismatch("string"),
            },
            SettingKind::List => match value {
                SettingValue::List(_) => Ok(()),
                _ => mismatch("list of strings"),
            },
            SettingKind::Enum(names) => match value {
                SettingValue::Str(s) if names.contains(&s.as_str()) => Ok(()),
                SettingValue::Str(s) => Err((
                    String::new(),
                    format!("unknown value '{s}' (expected one of: {})", names.join(", ")),
                )),
                _ => mismatch("string"),
            },
            SettingKind::StringMap => match value {
                SettingValue::Table(table) => {
                    for (key, entry) in table.iter() {
                        if !matches!(entry, SettingValue::Str(_) | SettingValue::Unset) {
                            return Err((
                                key.clone(),
                                format!("expected string, found {}", entry.kind()),
                            ));
                        }
                    }
                    Ok(())
                }
                _ => mismatch("table"),
            },
            SettingKind::Table(schema) => match value {
                SettingValue::Table(table) => {
                    for (key, entry) in table.iter() {
                        let Some((_, kind)) = schema.iter().find(|(name, _)| *name == key.as_str())
                        else {
                            continue;
                        };
                        kind.check(entry).map_err(|(sub, reason)| {
                            let path = if sub.is_empty() {
                                key.clone()
                            } else {
                                format!("{key}.{sub}")
                            };
                            (path, reason)
                        })?;
                    }
                    Ok(())
                }
                _ => mismatch("table"),
            },
        }
    }
}

// ── Effective configuration ─────────────────────────────────────────────

/// Household memory inclusion flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccess {
    pub include_personal: bool,
    pub include_shared: bool,
}

/// Action permission lists. Deny wins over allow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub allowed: Vec<String>,
    pub denied: Vec<String>,
}

impl Permissions {
    /// Check one action name, e.g. `lock.front_door` or `music.play`.
    pub fn is_allowed(&self, action: &str) -> bool {
        if self.denied.iter().any(|p| pattern_matches(p, action)) {
            return false;
        }
        self.allowed.iter().any(|p| pattern_matches(p, action))
    }
}

/// `*` matches anything; `domain.*` matches `domain` and `domain.<anything>`.
fn pattern_matches(pattern: &str, action: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(domain) = pattern.strip_suffix(".*") {
        return action == domain
            || action
                .strip_prefix(domain)
                .is_some_and(|rest| rest.starts_with('.'));
    }
    pattern == action
}

/// A setting value the resolver could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedValue {
    pub field: String,
    pub value: String,
    pub reason: String,
}

/// A condition that failed to evaluate and was treated as false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFailure {
    pub condition: String,
    pub error: String,
}

/// Ordered record of what contributed to a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTrace {
    /// Layer and condition identifiers, in the order they were merged.
    pub applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition_errors: Vec<ConditionFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_values: Vec<RejectedValue>,
}

/// The single resolved behavior profile for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfiguration {
    pub response_style: ResponseStyle,
    pub vocabulary_level: VocabularyLevel,
    /// Maximum reply length in words. Always at least 1.
    pub max_response_length: usize,
    pub content_restrictions: BTreeSet<String>,
    pub blocked_topics: BTreeSet<String>,
    pub proactive_suggestions: bool,
    pub proactive_frequency: ProactiveFrequency,
    pub interruption_threshold: InterruptionThreshold,
    pub voice_responses: bool,
    pub voice_volume: VoiceVolume,
    pub voice: String,
    pub notifications: NotificationMode,
    /// Model-selection key handed to the response generator.
    pub model: String,
    pub memory: MemoryAccess,
    pub permissions: Permissions,
    pub preferred_vocabulary: Vec<String>,
    pub avoid_concepts: Vec<String>,
    pub word_replacements: BTreeMap<String, String>,
    pub interests: Vec<String>,
    pub trace: ResolutionTrace,
}

pub const DEFAULT_MAX_RESPONSE_LENGTH: usize = 150;
pub const RESTRICTIVE_MAX_RESPONSE_LENGTH: usize = 50;

/// Content categories the transformer knows how to filter.
pub const CONTENT_CATEGORIES: &[&str] = &["profanity", "violence", "mature_themes", "scary_content"];

impl Default for EffectiveConfiguration {
    fn default() -> Self {
        Self {
            response_style: ResponseStyle::system_default(),
            vocabulary_level: VocabularyLevel::system_default(),
            max_response_length: DEFAULT_MAX_RESPONSE_LENGTH,
            content_restrictions: BTreeSet::new(),
            blocked_topics: BTreeSet::new(),
            proactive_suggestions: true,
            proactive_frequency: ProactiveFrequency::system_default(),
            interruption_threshold: InterruptionThreshold::system_default(),
            voice_responses: true,
            voice_volume: VoiceVolume::system_default(),
            voice: "default".into(),
            notifications: NotificationMode::system_default(),
            model: "default".into(),
            memory: MemoryAccess {
                include_personal: true,
                include_shared: true,
            },
            permissions: Permissions {
                allowed: vec!["*".into()],
                denied: vec![],
            },
            preferred_vocabulary: vec![],
            avoid_concepts: vec![],
            word_replacements: BTreeMap::new(),
            interests: vec![],
            trace: ResolutionTrace::default(),
        }
    }
}

impl EffectiveConfiguration {
    /// The profile with every field at its fail-closed value.
    pub fn restrictive() -> Self {
        Self {
            response_style: ResponseStyle::restrictive(),
            vocabulary_level: VocabularyLevel::restrictive(),
            max_response_length: RESTRICTIVE_MAX_RESPONSE_LENGTH,
            content_restrictions: CONTENT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            proactive_suggestions: false,
            proactive_frequency: ProactiveFrequency::restrictive(),
            interruption_threshold: InterruptionThreshold::restrictive(),
            voice_responses: false,
            voice_volume: VoiceVolume::restrictive(),
            notifications: NotificationMode::restrictive(),
            memory: MemoryAccess {
                include_personal: false,
                include_shared: false,
            },
            permissions: Permissions {
                allowed: vec![],
                denied: vec![],
            },
            ..Self::default()
        }
    }

    pub fn is_action_allowed(&self, action: &str) -> bool {
        self.permissions.is_allowed(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_parse_and_display() {
        assert_eq!(
            VocabularyLevel::parse("very_simple").unwrap(),
            VocabularyLevel::VerySimple
        );
        assert_eq!(NotificationMode::VisualOnly.to_string(), "visual_only");
        let err = ResponseStyle::parse("sarcastic").unwrap_err();
        assert_eq!(err.field, "response_style");
        assert!(err.expected.contains(&"brief"));
    }

    #[test]
    fn enum_serde_matches_names() {
        let json = serde_json::to_string(&InterruptionThreshold::UrgentOnly).unwrap();
        assert_eq!(json, "\"urgent_only\"");
        for name in VoiceVolume::NAMES {
            let parsed: VoiceVolume = serde_json::from_str(&format!("\"{name}\"")).unwrap();
            assert_eq!(parsed.as_str(), *name);
        }
    }

    #[test]
    fn restrictive_profile_is_locked_down() {
        let cfg = EffectiveConfiguration::restrictive();
        assert!(!cfg.proactive_suggestions);
        assert_eq!(cfg.content_restrictions.len(), CONTENT_CATEGORIES.len());
        assert!(!cfg.is_action_allowed("lights.on"));
    }

    #[test]
    fn permissions_deny_wins() {
        let perms = Permissions {
            allowed: vec!["*".into()],
            denied: vec!["lock.*".into(), "purchase".into()],
        };
        assert!(perms.is_allowed("lights.kitchen"));
        assert!(!perms.is_allowed("lock.front_door"));
        assert!(!perms.is_allowed("lock"));
        assert!(perms.is_allowed("locksmith.call"));
        assert!(!perms.is_allowed("purchase"));
    }

    #[test]
    fn schema_checks_types_and_enums() {
        let kind = setting_kind("vocabulary_level").unwrap();
        assert!(kind.check(&SettingValue::Str("toddler".into())).is_ok());
        let (_, reason) = kind.check(&SettingValue::Str("baby".into())).unwrap_err();
        assert!(reason.contains("'baby'"));

        let kind = setting_kind("max_response_length").unwrap();
        assert!(kind.check(&SettingValue::Int(30)).is_ok());
        assert!(kind.check(&SettingValue::Int(0)).is_err());
        assert!(kind.check(&SettingValue::Unset).is_ok());
    }

    #[test]
    fn schema_reports_nested_path() {
        let mut memory = crate::Fragment::new();
        memory.insert("include_shared", SettingValue::Str("yes".into()));
        let kind = setting_kind("memory").unwrap();
        let (path, _) = kind.check(&SettingValue::Table(memory)).unwrap_err();
        assert_eq!(path, "include_shared");
    }
}
