//! The validated, immutable layer store.
//!
//! A [`LayerStore`] is built once from a document and never mutated. A
//! reload builds a fresh store and swaps it in whole; a document that fails
//! validation produces no store at all.

use crate::ConfigError;
use crate::document::{ConditionDoc, Document, FamilyGroupDoc, MemberDoc, RoomDoc, TimePeriodDoc};
use crate::time::{DaySet, TimeRange};
use hearth_core::{Fragment, ResolutionContext, SettingValue, setting_kind};
use hearth_expr::CompiledExpr;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Source document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick the format from a file extension. No extension means TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(Format::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext.to_string(),
            }),
        }
    }
}

/// How a time-period layer becomes active.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Active inside the daily window on the listed days.
    Window { range: TimeRange, days: DaySet },
    /// Active only when named in the request's manual modes.
    Manual,
}

#[derive(Debug, Clone)]
pub struct TimePeriodLayer {
    pub name: String,
    pub description: String,
    pub activation: Activation,
    pub enabled: bool,
    pub settings: Fragment,
}

impl TimePeriodLayer {
    /// Trace identifier, e.g. `time:night_mode`.
    pub fn id(&self) -> String {
        format!("time:{}", self.name)
    }

    pub fn is_active(&self, ctx: &ResolutionContext) -> bool {
        if !self.enabled {
            return false;
        }
        match &self.activation {
            Activation::Manual => ctx.manual_modes.contains(&self.name),
            Activation::Window { range, days } => {
                days.contains(ctx.weekday()) && range.contains(ctx.time())
            }
        }
    }
}

/// A condition attached to a room, possibly with nested conditions.
#[derive(Debug, Clone)]
pub struct RoomCondition {
    /// Full trace identifier, e.g. `room:nursery/condition:nap_time`.
    pub id: String,
    pub expr: CompiledExpr,
    pub settings: Fragment,
    pub conditions: Vec<RoomCondition>,
}

#[derive(Debug, Clone)]
pub struct RoomLayer {
    pub location_id: String,
    pub name: Option<String>,
    pub settings: Fragment,
    pub conditions: Vec<RoomCondition>,
}

impl RoomLayer {
    pub fn id(&self) -> String {
        format!("room:{}", self.location_id)
    }
}

#[derive(Debug, Clone)]
pub struct FamilyGroupLayer {
    pub name: String,
    pub members: BTreeSet<String>,
    pub settings: Fragment,
}

impl FamilyGroupLayer {
    pub fn id(&self) -> String {
        format!("group:{}", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct IndividualLayer {
    pub member_id: String,
    pub name: Option<String>,
    pub settings: Fragment,
}

impl IndividualLayer {
    pub fn id(&self) -> String {
        format!("member:{}", self.member_id)
    }
}

/// Layer counts, for status output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreSummary {
    pub base_keys: usize,
    pub time_periods: usize,
    pub manual_periods: usize,
    pub rooms: usize,
    pub conditions: usize,
    pub broken_conditions: usize,
    pub family_groups: usize,
    pub family_members: usize,
}

/// All configuration layers, validated.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    base: Fragment,
    time_periods: Vec<TimePeriodLayer>,
    rooms: BTreeMap<String, RoomLayer>,
    groups: Vec<FamilyGroupLayer>,
    members: BTreeMap<String, IndividualLayer>,
}

impl LayerStore {
    /// Load a store from a file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let store = Self::parse(&content, format, &path.display().to_string())?;
        info!(path = %path.display(), "Layer store loaded");
        Ok(store)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Toml, "<inline>")
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Format::Json, "<inline>")
    }

    /// Parse and validate a document. `origin` names the source in errors.
    pub fn parse(content: &str, format: Format, origin: &str) -> Result<Self, ConfigError> {
        let document: Document = match format {
            Format::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse {
                origin: origin.into(),
                reason: e.to_string(),
            })?,
            Format::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                origin: origin.into(),
                reason: e.to_string(),
            })?,
        };
        Self::from_document(document)
    }

    fn from_document(doc: Document) -> Result<Self, ConfigError> {
        validate_fragment("base_defaults", &doc.base_defaults)?;

        let mut seen = HashSet::new();
        let mut time_periods = Vec::with_capacity(doc.time_periods.len());
        for (index, period) in doc.time_periods.into_iter().enumerate() {
            let layer = build_time_period(index, period)?;
            if !seen.insert(layer.name.clone()) {
                return Err(ConfigError::validation(
                    format!("time_periods[{index}].name"),
                    format!("duplicate time period '{}'", layer.name),
                ));
            }
            time_periods.push(layer);
        }

        let mut rooms = BTreeMap::new();
        for (location_id, room) in doc.rooms {
            let layer = build_room(&location_id, room)?;
            rooms.insert(location_id, layer);
        }

        let mut members = BTreeMap::new();
        for (member_id, member) in doc.family_members {
            let layer = build_member(&member_id, member)?;
            members.insert(member_id, layer);
        }

        let mut seen = HashSet::new();
        let mut grouped: BTreeMap<String, String> = BTreeMap::new();
        let mut groups = Vec::with_capacity(doc.family_groups.len());
        for (index, group) in doc.family_groups.into_iter().enumerate() {
            let layer = build_group(index, group)?;
            if !seen.insert(layer.name.clone()) {
                return Err(ConfigError::validation(
                    format!("family_groups[{index}].name"),
                    format!("duplicate family group '{}'", layer.name),
                ));
            }
            for member in &layer.members {
                if !members.contains_key(member) {
                    debug!(group = %layer.name, member = %member, "Group member has no individual profile");
                }
                if let Some(first) = grouped.get(member) {
                    warn!(
                        member = %member,
                        first_group = %first,
                        ignored_group = %layer.name,
                        "Member listed in several family groups; only the first applies"
                    );
                } else {
                    grouped.insert(member.clone(), layer.name.clone());
                }
            }
            groups.push(layer);
        }

        Ok(Self {
            base: doc.base_defaults,
            time_periods,
            rooms,
            groups,
            members,
        })
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn base(&self) -> &Fragment {
        &self.base
    }

    /// Time-period layers active for `ctx`, in declaration order.
    pub fn active_time_layers(&self, ctx: &ResolutionContext) -> Vec<&TimePeriodLayer> {
        self.time_periods
            .iter()
            .filter(|p| p.is_active(ctx))
            .collect()
    }

    pub fn room_layer(&self, location_id: &str) -> Option<&RoomLayer> {
        self.rooms.get(location_id)
    }

    /// The first declared group containing the speaker.
    pub fn matching_group(&self, speaker_id: &str) -> Option<&FamilyGroupLayer> {
        self.groups.iter().find(|g| g.members.contains(speaker_id))
    }

    pub fn individual_layer(&self, speaker_id: &str) -> Option<&IndividualLayer> {
        self.members.get(speaker_id)
    }

    pub fn time_periods(&self) -> &[TimePeriodLayer] {
        &self.time_periods
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomLayer> {
        self.rooms.values()
    }

    pub fn groups(&self) -> &[FamilyGroupLayer] {
        &self.groups
    }

    pub fn members(&self) -> impl Iterator<Item = &IndividualLayer> {
        self.members.values()
    }

    pub fn summary(&self) -> StoreSummary {
        fn count(conditions: &[RoomCondition]) -> (usize, usize) {
            conditions.iter().fold((0, 0), |(total, broken), c| {
                let (t, b) = count(&c.conditions);
                (
                    total + 1 + t,
                    broken + usize::from(c.expr.error().is_some()) + b,
                )
            })
        }
        let (conditions, broken_conditions) = self
            .rooms
            .values()
            .map(|r| count(&r.conditions))
            .fold((0, 0), |(a, b), (t, br)| (a + t, b + br));

        StoreSummary {
            base_keys: self.base.len(),
            time_periods: self.time_periods.len(),
            manual_periods: self
                .time_periods
                .iter()
                .filter(|p| p.activation == Activation::Manual)
                .count(),
            rooms: self.rooms.len(),
            conditions,
            broken_conditions,
            family_groups: self.groups.len(),
            family_members: self.members.len(),
        }
    }
}

// ── Building and validation ─────────────────────────────────────────────

fn build_time_period(index: usize, doc: TimePeriodDoc) -> Result<TimePeriodLayer, ConfigError> {
    let path = format!("time_periods[{index}]");
    if doc.name.trim().is_empty() {
        return Err(ConfigError::validation(
            format!("{path}.name"),
            "time period name cannot be empty",
        ));
    }

    let activation = if doc.manual {
        if doc.start.is_some() || doc.end.is_some() || doc.days.is_some() {
            return Err(ConfigError::validation(
                path,
                format!(
                    "time period '{}' is manual-only but also declares a window; use one or the other",
                    doc.name
                ),
            ));
        }
        Activation::Manual
    } else {
        let (Some(start), Some(end)) = (&doc.start, &doc.end) else {
            return Err(ConfigError::validation(
                path,
                format!(
                    "time period '{}' must declare both start and end, or set manual = true",
                    doc.name
                ),
            ));
        };
        let range = TimeRange::parse(start, end)
            .map_err(|reason| ConfigError::validation(format!("{path}.start"), reason))?;
        if range.start == range.end {
            return Err(ConfigError::validation(
                format!("{path}.end"),
                "start and end are equal; the window is ambiguous",
            ));
        }
        let days = match &doc.days {
            Some(names) => DaySet::parse(names.as_slice())
                .map_err(|reason| ConfigError::validation(format!("{path}.days"), reason))?,
            None => DaySet::all(),
        };
        Activation::Window { range, days }
    };

    validate_fragment(&format!("{path}.settings"), &doc.settings)?;

    Ok(TimePeriodLayer {
        name: doc.name,
        description: doc.description,
        activation,
        enabled: doc.enabled,
        settings: doc.settings,
    })
}

fn build_room(location_id: &str, doc: RoomDoc) -> Result<RoomLayer, ConfigError> {
    let path = format!("rooms.{location_id}");
    validate_fragment(&format!("{path}.settings"), &doc.settings)?;
    let conditions = build_conditions(&path, &format!("room:{location_id}"), doc.conditions)?;
    Ok(RoomLayer {
        location_id: location_id.to_string(),
        name: doc.name,
        settings: doc.settings,
        conditions,
    })
}

fn build_conditions(
    path: &str,
    parent_id: &str,
    docs: Vec<ConditionDoc>,
) -> Result<Vec<RoomCondition>, ConfigError> {
    let mut out = Vec::with_capacity(docs.len());
    for (index, doc) in docs.into_iter().enumerate() {
        let path = format!("{path}.conditions[{index}]");
        let label = doc
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("#{index}"));
        let id = format!("{parent_id}/condition:{label}");

        validate_fragment(&format!("{path}.settings"), &doc.settings)?;

        let expr = CompiledExpr::compile(doc.when);
        if let Some(e) = expr.error() {
            warn!(
                condition = %id,
                expression = %expr.source(),
                error = %e,
                "Condition does not compile; it will always evaluate false"
            );
        }

        let conditions = build_conditions(&path, &id, doc.conditions)?;
        out.push(RoomCondition {
            id,
            expr,
            settings: doc.settings,
            conditions,
        });
    }
    Ok(out)
}

fn build_group(index: usize, doc: FamilyGroupDoc) -> Result<FamilyGroupLayer, ConfigError> {
    let path = format!("family_groups[{index}]");
    if doc.name.trim().is_empty() {
        return Err(ConfigError::validation(
            format!("{path}.name"),
            "family group name cannot be empty",
        ));
    }
    validate_fragment(&format!("{path}.settings"), &doc.settings)?;
    Ok(FamilyGroupLayer {
        name: doc.name,
        members: doc.members.into_iter().collect(),
        settings: doc.settings,
    })
}

fn build_member(member_id: &str, doc: MemberDoc) -> Result<IndividualLayer, ConfigError> {
    let mut settings = doc.settings;
    if !doc.interests.is_empty() && !settings.contains_key("interests") {
        settings.insert("interests", SettingValue::List(doc.interests));
    }
    validate_fragment(&format!("family_members.{member_id}.settings"), &settings)?;
    Ok(IndividualLayer {
        member_id: member_id.to_string(),
        name: doc.name,
        settings,
    })
}

/// Check every known key in a fragment against the settings schema.
fn validate_fragment(path: &str, fragment: &Fragment) -> Result<(), ConfigError> {
    for (key, value) in fragment.iter() {
        match setting_kind(key) {
            Some(kind) => kind.check(value).map_err(|(sub, reason)| {
                let field = if sub.is_empty() {
                    format!("{path}.{key}")
                } else {
                    format!("{path}.{key}.{sub}")
                };
                ConfigError::validation(field, reason)
            })?,
            None => debug!(field = %format!("{path}.{key}"), "Unknown setting key kept as-is"),
        }
    }
    Ok(())
}
