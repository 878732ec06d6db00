//! Raw shape of the layer document, as written by the household.
//!
//! ```toml
//! [base_defaults]
//! response_style = "conversational"
//!
//! [[time_periods]]
//! name = "night_mode"
//! start = "21:00"
//! end = "07:00"
//! [time_periods.settings]
//! voice_responses = false
//!
//! [rooms.nursery.settings]
//! voice_responses = false
//! [[rooms.nursery.conditions]]
//! name = "nap_time"
//! when = "hour >= 13 and hour < 15"
//! [rooms.nursery.conditions.settings]
//! voice_volume = "whisper"
//!
//! [[family_groups]]
//! name = "children"
//! members = ["child_a"]
//! [family_groups.settings]
//! content_restrictions = ["profanity", "violence"]
//!
//! [family_members.child_a]
//! name = "Ada"
//! interests = ["dinosaurs"]
//! [family_members.child_a.settings]
//! vocabulary_level = "very_simple"
//! ```
//!
//! Structural tables reject unknown fields so a misspelled section fails the
//! load instead of silently doing nothing. Settings fragments accept any key.

use hearth_core::Fragment;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Document {
    #[serde(default)]
    pub base_defaults: Fragment,

    /// Ordered: later periods win per key when several are active.
    #[serde(default)]
    pub time_periods: Vec<TimePeriodDoc>,

    #[serde(default)]
    pub rooms: BTreeMap<String, RoomDoc>,

    /// Ordered: the first group containing the speaker applies.
    #[serde(default)]
    pub family_groups: Vec<FamilyGroupDoc>,

    #[serde(default)]
    pub family_members: BTreeMap<String, MemberDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TimePeriodDoc {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Activated only through the request's manual modes.
    #[serde(default)]
    pub manual: bool,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub end: Option<String>,

    #[serde(default)]
    pub days: Option<Vec<String>>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub settings: Fragment,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RoomDoc {
    /// Display name; the table key is the location identifier.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub settings: Fragment,

    #[serde(default)]
    pub conditions: Vec<ConditionDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConditionDoc {
    #[serde(default)]
    pub name: Option<String>,

    pub when: String,

    #[serde(default)]
    pub settings: Fragment,

    /// Evaluated only when this condition is true.
    #[serde(default)]
    pub conditions: Vec<ConditionDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FamilyGroupDoc {
    pub name: String,

    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default)]
    pub settings: Fragment,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MemberDoc {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub interests: Vec<String>,

    #[serde(default)]
    pub settings: Fragment,
}

fn default_true() -> bool {
    true
}
