//! Runtime settings for the config watcher, plus the default file location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const INTERVAL_ENV: &str = "HEARTH_WATCH_INTERVAL_MS";
pub const DEBOUNCE_ENV: &str = "HEARTH_WATCH_DEBOUNCE_MS";

/// Polling and debounce timings for the config watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// How often the file is checked for a new content hash.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a new hash must stay unchanged before it is applied.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatchConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = read_millis(&lookup, INTERVAL_ENV) {
            // A zero tick would make tokio's interval panic.
            self.poll_interval_ms = ms.max(1);
        }
        if let Some(ms) = read_millis(&lookup, DEBOUNCE_ENV) {
            self.debounce_ms = ms;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn read_millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric watcher override");
            None
        }
    }
}

/// `~/.hearth`
pub fn config_dir() -> PathBuf {
    dirs_home().join(".hearth")
}

/// `~/.hearth/profiles.toml`
pub fn default_config_path() -> PathBuf {
    config_dir().join("profiles.toml")
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn env_overrides() {
        let mut config = WatchConfig::default();
        config.apply_overrides(lookup(&[(INTERVAL_ENV, "250"), (DEBOUNCE_ENV, " 0 ")]));
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.debounce_ms, 0);
    }

    #[test]
    fn bad_overrides_ignored() {
        let mut config = WatchConfig::default();
        config.apply_overrides(lookup(&[(INTERVAL_ENV, "soon"), (DEBOUNCE_ENV, "-5")]));
        assert_eq!(config, WatchConfig::default());
    }

    #[test]
    fn zero_interval_clamped() {
        let mut config = WatchConfig::default();
        config.apply_overrides(lookup(&[(INTERVAL_ENV, "0")]));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: WatchConfig = toml::from_str("debounce_ms = 100").unwrap();
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn default_path_under_config_dir() {
        let path = default_config_path();
        assert!(path.ends_with(".hearth/profiles.toml"));
    }
}
