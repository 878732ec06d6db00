//! The per-request resolution context.
//!
//! Everything a resolution may look at is materialized here before the
//! resolver runs: who is speaking, where, when, which manual modes are on,
//! and a snapshot of external state values. Nothing is queried live.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Day of the week, serialized lowercase (`"tuesday"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            "sunday" | "sun" => Ok(Weekday::Sunday),
            other => Err(format!("unknown weekday: {other}")),
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Input to one resolution.
///
/// `timestamp` is household-local wall-clock time; converting from UTC is
/// the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionContext {
    /// Resolved speaker, if the speaker-matching collaborator identified one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,

    /// Room / area identifier from the device registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    pub timestamp: NaiveDateTime,

    /// Names of manual-only time periods the household switched on.
    #[serde(default)]
    pub manual_modes: BTreeSet<String>,

    /// Snapshot of external state values (sensors, presence, ...).
    #[serde(default)]
    pub state: BTreeMap<String, serde_json::Value>,

    /// Who is currently in the home / room.
    #[serde(default)]
    pub occupants: BTreeSet<String>,
}

impl ResolutionContext {
    /// A context with nothing but a timestamp.
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            speaker_id: None,
            location_id: None,
            timestamp,
            manual_modes: BTreeSet::new(),
            state: BTreeMap::new(),
            occupants: BTreeSet::new(),
        }
    }

    pub fn with_speaker(mut self, speaker_id: impl Into<String>) -> Self {
        self.speaker_id = Some(speaker_id.into());
        self
    }

    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.manual_modes.insert(mode.into());
        self
    }

    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }

    pub fn with_occupant(mut self, occupant: impl Into<String>) -> Self {
        self.occupants.insert(occupant.into());
        self
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn minute(&self) -> u32 {
        self.timestamp.minute()
    }

    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn derives_time_fields() {
        // 2026-10-20 is a Tuesday.
        let ctx = ResolutionContext::at(ts(2026, 10, 20, 21, 30));
        assert_eq!(ctx.hour(), 21);
        assert_eq!(ctx.minute(), 30);
        assert_eq!(ctx.weekday(), Weekday::Tuesday);
        assert!(!ctx.weekday().is_weekend());
    }

    #[test]
    fn builder_sets_fields() {
        let ctx = ResolutionContext::at(ts(2026, 10, 24, 9, 0))
            .with_speaker("child_a")
            .with_location("nursery")
            .with_mode("guest_mode")
            .with_state("tv", serde_json::json!("on"))
            .with_occupant("parent_b");
        assert_eq!(ctx.speaker_id.as_deref(), Some("child_a"));
        assert_eq!(ctx.location_id.as_deref(), Some("nursery"));
        assert!(ctx.manual_modes.contains("guest_mode"));
        assert_eq!(ctx.state["tv"], serde_json::json!("on"));
        assert!(ctx.occupants.contains("parent_b"));
        assert!(ctx.weekday().is_weekend());
    }

    #[test]
    fn weekday_parsing() {
        assert_eq!("Tuesday".parse::<Weekday>().unwrap(), Weekday::Tuesday);
        assert_eq!("sat".parse::<Weekday>().unwrap(), Weekday::Saturday);
        assert!("funday".parse::<Weekday>().is_err());
    }
}
