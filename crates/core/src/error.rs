//! Error types for the Hearth domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each crate keeps its own error enum; this one is the aggregate used where
//! crates meet (the watcher, the CLI).

use thiserror::Error;

/// The top-level error type for Hearth operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A setting value that does not belong to its field's declared value set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value '{value}' for {field} (expected one of: {})", expected.join(", "))]
pub struct UnknownEnumValue {
    pub field: String,
    pub value: String,
    pub expected: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_enum_lists_allowed_values() {
        let err = UnknownEnumValue {
            field: "vocabulary_level".into(),
            value: "baby".into(),
            expected: vec!["adult", "simple"],
        };
        let msg = err.to_string();
        assert!(msg.contains("vocabulary_level"));
        assert!(msg.contains("'baby'"));
        assert!(msg.contains("adult, simple"));
    }

    #[test]
    fn io_errors_convert() {
        fn read() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "profiles.toml"))?
        }
        let err = read().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = Error::Config {
            message: "rooms.nursery: bad".into(),
        };
        assert!(err.to_string().contains("rooms.nursery"));
    }
}
