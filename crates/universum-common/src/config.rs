//! Process-level configuration for the Universum CLI.
//!
//! Component settings do not live here: they are declared by each
//! component and parsed into a settings tree by the container.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UniversumError;

/// Formatter used for diagnostic logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = UniversumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(UniversumError::Config {
                message: format!("unknown log format \"{other}\" (expected text or json)"),
            }),
        }
    }
}

/// Logging configuration applied once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Output formatter.
    pub format: LogFormat,
    /// Fallback filter directives used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            default_filter: "warn".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("text".parse::<LogFormat>().expect("text"), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().expect("json"), LogFormat::Json);
    }

    #[test]
    fn log_format_rejects_unknown() {
        let err = "yaml".parse::<LogFormat>().expect_err("should fail");
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn default_logging_is_quiet_text() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.default_filter, "warn");
    }
}
