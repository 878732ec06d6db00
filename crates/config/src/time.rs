//! Daily time windows and weekday sets for time-period layers.

use chrono::NaiveTime;
use hearth_core::Weekday;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A daily window. When `start > end` the window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` (or `HH:MM:SS`) bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        Ok(Self {
            start: parse_time(start)?,
            end: parse_time(end)?,
        })
    }

    /// Whether the window wraps past midnight.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Inclusive at both ends.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.is_inverted() {
            t >= self.start || t <= self.end
        } else {
            self.start <= t && t <= self.end
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{s}' (expected HH:MM)"))
}

/// The weekdays a window applies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySet(BTreeSet<Weekday>);

impl DaySet {
    pub fn all() -> Self {
        Self(Weekday::ALL.into_iter().collect())
    }

    /// Parse day names plus the shorthands `weekdays`, `weekends`, `all`.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        if names.is_empty() {
            return Err("days list is empty; omit it to mean every day".into());
        }
        let mut days = BTreeSet::new();
        for name in names {
            match name.as_ref().trim().to_ascii_lowercase().as_str() {
                "all" | "daily" | "everyday" => days.extend(Weekday::ALL),
                "weekdays" => days.extend(Weekday::ALL.into_iter().filter(|d| !d.is_weekend())),
                "weekends" | "weekend" => {
                    days.extend(Weekday::ALL.into_iter().filter(|d| d.is_weekend()))
                }
                other => {
                    days.insert(other.parse::<Weekday>()?);
                }
            }
        }
        Ok(Self(days))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() == 7 {
            return f.write_str("every day");
        }
        let names: Vec<&str> = self.0.iter().map(Weekday::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn daytime_window() {
        let range = TimeRange::parse("09:00", "17:00").unwrap();
        assert!(!range.is_inverted());
        assert!(range.contains(t(9, 0)));
        assert!(range.contains(t(12, 30)));
        assert!(range.contains(t(17, 0)));
        assert!(!range.contains(t(8, 59)));
        assert!(!range.contains(t(17, 1)));
    }

    #[test]
    fn overnight_window() {
        let range = TimeRange::parse("22:00", "06:00").unwrap();
        assert!(range.is_inverted());
        assert!(range.contains(t(23, 30)));
        assert!(range.contains(t(5, 0)));
        assert!(range.contains(t(0, 0)));
        assert!(range.contains(t(22, 0)));
        assert!(!range.contains(t(12, 0)));
        assert!(!range.contains(t(6, 1)));
    }

    #[test]
    fn rejects_bad_times() {
        assert!(TimeRange::parse("25:00", "06:00").is_err());
        assert!(TimeRange::parse("9am", "17:00").is_err());
        assert!(TimeRange::parse("09:00:30", "17:00").is_ok());
    }

    #[test]
    fn day_shorthands() {
        let weekdays = DaySet::parse(&["weekdays"]).unwrap();
        assert_eq!(weekdays.len(), 5);
        assert!(weekdays.contains(Weekday::Friday));
        assert!(!weekdays.contains(Weekday::Sunday));

        let mixed = DaySet::parse(&["weekends", "Friday"]).unwrap();
        assert_eq!(mixed.len(), 3);
        assert_eq!(DaySet::parse(&["all"]).unwrap(), DaySet::all());
        assert!(DaySet::parse::<&str>(&[]).is_err());
        assert!(DaySet::parse(&["someday"]).is_err());
    }
}
