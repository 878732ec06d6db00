//! # Hearth Core
//!
//! Domain types shared by every Hearth crate: settings fragments and their
//! deep-merge rules, the per-request resolution context, and the typed
//! behavior profile that resolution produces.
//!
//! ## Design Philosophy
//!
//! This crate holds data and pure functions only. Loading, evaluation and
//! text processing live in their own crates and depend inward on core:
//! - `hearth-expr` evaluates condition expressions against a [`ResolutionContext`]
//! - `hearth-config` parses the layer document into fragments
//! - `hearth-resolver` merges fragments into an [`EffectiveConfiguration`]
//! - `hearth-transform` applies an [`EffectiveConfiguration`] to draft text

pub mod context;
pub mod error;
pub mod fragment;
pub mod profile;

// Re-export key types at crate root for ergonomics
pub use context::{ResolutionContext, Weekday};
pub use error::{Error, Result, UnknownEnumValue};
pub use fragment::{Fragment, SettingValue, UNSET_MARKER, deep_merge};
pub use profile::{
    CONTENT_CATEGORIES, ConditionFailure, EffectiveConfiguration, InterruptionThreshold,
    MemoryAccess, NotificationMode, Permissions, ProactiveFrequency, RejectedValue,
    ResolutionTrace, ResponseStyle, SETTINGS_SCHEMA, SettingEnum, SettingKind, VocabularyLevel,
    VoiceVolume, setting_kind,
};
