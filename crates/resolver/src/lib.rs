//! Override resolution.
//!
//! Selects the layers active for a request and deep-merges them in strict
//! priority order:
//!
//! 1. base defaults
//! 2. active time periods, in declaration order
//! 3. the room, then each of its conditions that holds
//! 4. the first family group containing the speaker
//! 5. the speaker's individual profile
//!
//! The merged fragment is then converted into a typed
//! [`EffectiveConfiguration`]. Resolution only reads the in-memory store; it
//! never touches disk, the network, or the wall clock.

pub mod convert;

use hearth_config::{LayerStore, RoomCondition};
use hearth_core::{
    ConditionFailure, EffectiveConfiguration, Fragment, ResolutionContext, ResolutionTrace,
    deep_merge,
};
use hearth_expr::EvalContext;
use tracing::{debug, warn};

pub use convert::to_effective;

/// Trace identifier of the base layer.
pub const BASE_LAYER_ID: &str = "base";

/// The merged settings fragment for a context, before type conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLayers {
    pub fragment: Fragment,
    pub trace: ResolutionTrace,
}

/// Resolve the effective configuration for one request.
pub fn resolve(store: &LayerStore, ctx: &ResolutionContext) -> EffectiveConfiguration {
    let MergedLayers {
        fragment,
        mut trace,
    } = merge_layers(store, ctx);
    let mut config = to_effective(&fragment, &mut trace);
    config.trace = trace;
    config
}

/// Merge every layer active for `ctx`, recording what was applied.
pub fn merge_layers(store: &LayerStore, ctx: &ResolutionContext) -> MergedLayers {
    let mut merger = Merger::default();

    merger.apply(BASE_LAYER_ID, store.base());

    for period in store.active_time_layers(ctx) {
        merger.apply(&period.id(), &period.settings);
    }

    if let Some(location) = ctx.location_id.as_deref() {
        match store.room_layer(location) {
            Some(room) => {
                merger.apply(&room.id(), &room.settings);
                let eval_ctx = EvalContext::from(ctx);
                merger.apply_conditions(&room.conditions, &eval_ctx);
            }
            None => debug!(location = %location, "No room layer for location"),
        }
    }

    if let Some(speaker) = ctx.speaker_id.as_deref() {
        if let Some(group) = store.matching_group(speaker) {
            merger.apply(&group.id(), &group.settings);
        }
        if let Some(member) = store.individual_layer(speaker) {
            merger.apply(&member.id(), &member.settings);
        }
    }

    MergedLayers {
        fragment: merger.fragment,
        trace: merger.trace,
    }
}

#[derive(Default)]
struct Merger {
    fragment: Fragment,
    trace: ResolutionTrace,
}

impl Merger {
    fn apply(&mut self, id: &str, settings: &Fragment) {
        deep_merge(&mut self.fragment, settings);
        self.trace.applied.push(id.to_string());
        debug!(layer = %id, keys = settings.len(), "Layer applied");
    }

    /// Apply each condition that holds, in order. Nested conditions are only
    /// considered when their parent held.
    fn apply_conditions(&mut self, conditions: &[RoomCondition], ctx: &EvalContext<'_>) {
        for condition in conditions {
            match condition.expr.evaluate(ctx) {
                Ok(true) => {
                    self.apply(&condition.id, &condition.settings);
                    self.apply_conditions(&condition.conditions, ctx);
                }
                Ok(false) => debug!(condition = %condition.id, "Condition not met"),
                Err(e) => {
                    warn!(
                        condition = %condition.id,
                        expression = %condition.expr.source(),
                        error = %e,
                        "Condition failed to evaluate; treating as false"
                    );
                    self.trace.condition_errors.push(ConditionFailure {
                        condition: condition.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hearth_core::{ResponseStyle, SettingValue, VoiceVolume};

    fn ctx(h: u32) -> ResolutionContext {
        // Tuesday
        ResolutionContext::at(
            NaiveDate::from_ymd_opt(2026, 10, 20)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
        )
    }

    fn store(doc: &str) -> LayerStore {
        LayerStore::from_toml_str(doc).unwrap()
    }

    #[test]
    fn base_always_applied_first() {
        let store = store("[base_defaults]\nresponse_style = \"brief\"\n");
        let config = resolve(&store, &ctx(12));
        assert_eq!(config.trace.applied, ["base"]);
        assert_eq!(config.response_style, ResponseStyle::Brief);
    }

    #[test]
    fn empty_store_yields_system_defaults() {
        let config = resolve(&LayerStore::default(), &ctx(12));
        let expected = EffectiveConfiguration {
            trace: ResolutionTrace {
                applied: vec!["base".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn unknown_room_and_speaker_contribute_nothing() {
        let store = store("[rooms.kitchen.settings]\nvoice = \"chef\"\n");
        let ctx = ctx(12).with_location("garage").with_speaker("nobody");
        let config = resolve(&store, &ctx);
        assert_eq!(config.trace.applied, ["base"]);
        assert_eq!(config.voice, "default");
    }

    #[test]
    fn conditions_stack_in_declaration_order() {
        let store = store(
            r#"
[rooms.den.settings]
voice_volume = "loud"

[[rooms.den.conditions]]
name = "afternoon"
when = "hour >= 12"
[rooms.den.conditions.settings]
voice_volume = "quiet"
model = "small"

[[rooms.den.conditions]]
name = "late_afternoon"
when = "hour >= 15"
[rooms.den.conditions.settings]
voice_volume = "whisper"
"#,
        );
        let merged = merge_layers(&store, &ctx(16).with_location("den"));
        assert_eq!(
            merged.trace.applied,
            [
                "base",
                "room:den",
                "room:den/condition:afternoon",
                "room:den/condition:late_afternoon"
            ]
        );
        assert_eq!(
            merged.fragment.get("voice_volume"),
            Some(&SettingValue::Str("whisper".into()))
        );
        assert_eq!(merged.fragment.get("model"), Some(&SettingValue::Str("small".into())));

        let config = resolve(&store, &ctx(13).with_location("den"));
        assert_eq!(config.voice_volume, VoiceVolume::Quiet);
    }

    #[test]
    fn nested_conditions_need_their_parent() {
        let store = store(
            r#"
[[rooms.den.conditions]]
name = "evening"
when = "hour >= 18"
[rooms.den.conditions.settings]
voice_volume = "quiet"

[[rooms.den.conditions.conditions]]
name = "baby_asleep"
when = 'state("baby_asleep")'
[rooms.den.conditions.conditions.settings]
voice_volume = "whisper"
"#,
        );
        let asleep = |h| {
            ctx(h)
                .with_location("den")
                .with_state("baby_asleep", serde_json::json!(true))
        };

        let config = resolve(&store, &asleep(20));
        assert_eq!(config.voice_volume, VoiceVolume::Whisper);
        assert_eq!(
            config.trace.applied.last().map(String::as_str),
            Some("room:den/condition:evening/condition:baby_asleep")
        );

        let config = resolve(&store, &asleep(10));
        assert_eq!(config.voice_volume, VoiceVolume::Normal);
        assert_eq!(config.trace.applied, ["base", "room:den"]);
    }

    #[test]
    fn failing_condition_is_recorded_and_skipped() {
        let store = store(
            r#"
[[rooms.den.conditions]]
name = "broken"
when = "hour >"
[rooms.den.conditions.settings]
voice_volume = "loud"

[[rooms.den.conditions]]
name = "mismatch"
when = 'state("mode") > 3'
[rooms.den.conditions.settings]
voice_volume = "loud"

[[rooms.den.conditions]]
name = "fine"
when = "true"
[rooms.den.conditions.settings]
voice = "calm"
"#,
        );
        let ctx = ctx(12)
            .with_location("den")
            .with_state("mode", serde_json::json!("movie"));
        let config = resolve(&store, &ctx);
        assert_eq!(config.voice_volume, VoiceVolume::Normal);
        assert_eq!(config.voice, "calm");
        let failed: Vec<_> = config
            .trace
            .condition_errors
            .iter()
            .map(|f| f.condition.as_str())
            .collect();
        assert_eq!(failed, ["room:den/condition:broken", "room:den/condition:mismatch"]);
    }

    #[test]
    fn group_before_individual() {
        let store = store(
            r#"
[[family_groups]]
name = "adults"
members = ["mom"]
[family_groups.settings]
model = "large"
voice = "warm"

[family_members.mom.settings]
voice = "bright"
"#,
        );
        let config = resolve(&store, &ctx(12).with_speaker("mom"));
        assert_eq!(config.trace.applied, ["base", "group:adults", "member:mom"]);
        assert_eq!(config.model, "large");
        assert_eq!(config.voice, "bright");
    }
}
