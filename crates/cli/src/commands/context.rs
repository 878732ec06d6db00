//! Request-context flags shared by `resolve` and `transform`.

use chrono::{DateTime, NaiveDateTime};
use clap::Args;
use hearth_core::ResolutionContext;

#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Speaker (family member) identifier
    #[arg(short, long)]
    pub speaker: Option<String>,

    /// Location (room) identifier
    #[arg(short, long)]
    pub location: Option<String>,

    /// Request time: RFC 3339 or YYYY-MM-DDTHH:MM (default: now, local time)
    #[arg(long)]
    pub at: Option<String>,

    /// Enable a manual mode (repeatable)
    #[arg(short, long = "mode")]
    pub modes: Vec<String>,

    /// External state value as KEY=VALUE; VALUE is parsed as JSON when it can be (repeatable)
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// Someone present in the room (repeatable)
    #[arg(short, long = "occupant")]
    pub occupants: Vec<String>,
}

impl ContextArgs {
    pub fn build(&self) -> Result<ResolutionContext, String> {
        let timestamp = match &self.at {
            Some(at) => parse_timestamp(at)?,
            None => chrono::Local::now().naive_local(),
        };

        let mut ctx = ResolutionContext::at(timestamp);
        if let Some(speaker) = &self.speaker {
            ctx = ctx.with_speaker(speaker);
        }
        if let Some(location) = &self.location {
            ctx = ctx.with_location(location);
        }
        for mode in &self.modes {
            ctx = ctx.with_mode(mode);
        }
        for state in &self.states {
            let (key, value) = parse_state(state)?;
            ctx = ctx.with_state(key, value);
        }
        for occupant in &self.occupants {
            ctx = ctx.with_occupant(occupant);
        }
        Ok(ctx)
    }
}

/// Offsets are dropped: the wall-clock time as written is what layers see.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .map_err(|_| format!("invalid --at '{s}' (expected RFC 3339 or YYYY-MM-DDTHH:MM)"))
}

pub fn parse_state(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid --state '{s}' (expected KEY=VALUE)"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid --state '{s}' (empty key)"));
    }
    let value = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
