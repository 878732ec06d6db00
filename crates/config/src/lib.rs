//! Layer document loading and validation for Hearth.
//!
//! Reads the household's profile document (TOML by default, JSON when the
//! file ends in `.json`), validates every layer against the settings schema,
//! and produces an immutable [`LayerStore`].

mod document;
pub mod settings;
pub mod store;
pub mod time;

pub use settings::{WatchConfig, config_dir, default_config_path};
pub use store::{
    Activation, FamilyGroupLayer, Format, IndividualLayer, LayerStore, RoomCondition, RoomLayer,
    StoreSummary, TimePeriodLayer,
};
pub use time::{DaySet, TimeRange};

use std::path::PathBuf;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config from {origin}: {reason}")]
    Parse { origin: String, reason: String },

    #[error("Invalid value at {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Unsupported config format '.{extension}' for {} (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for hearth_core::Error {
    fn from(e: ConfigError) -> Self {
        hearth_core::Error::Config {
            message: e.to_string(),
        }
    }
}
