//! Data-source and logging configuration.
//!
//! # Responsibility
//! - Describe where repositories acquire their connections.
//! - Describe optional file logging for embedding applications.
//! - Parse both from one JSON document.
//!
//! # Invariants
//! - File data sources always carry a non-empty path.
//! - Omitted tuning values fall back to documented defaults.

use crate::logging::default_log_level;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Memory database names end up inside a SQLite URI.
static MEMORY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid memory name regex"));

/// Configuration parse and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid configuration document: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage location of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSourceMode {
    /// SQLite database file, opened once per repository operation.
    File { path: PathBuf },
    /// Named shared in-memory database. A missing name gets a unique one.
    Memory {
        #[serde(default)]
        name: Option<String>,
    },
}

/// Connection settings for one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub mode: DataSourceMode,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
}

impl DataSourceConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_mode(DataSourceMode::File { path: path.into() })
    }

    pub fn memory() -> Self {
        Self::with_mode(DataSourceMode::Memory { name: None })
    }

    pub fn named_memory(name: impl Into<String>) -> Self {
        Self::with_mode(DataSourceMode::Memory {
            name: Some(name.into()),
        })
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Checks settings that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.mode {
            DataSourceMode::File { path } if path.as_os_str().is_empty() => Err(
                ConfigError::Invalid("file data source path cannot be empty".to_string()),
            ),
            DataSourceMode::Memory { name: Some(name) } if name.trim().is_empty() => Err(
                ConfigError::Invalid("memory data source name cannot be blank".to_string()),
            ),
            DataSourceMode::Memory { name: Some(name) } if !MEMORY_NAME_RE.is_match(name) => {
                Err(ConfigError::Invalid(format!(
                    "memory data source name `{name}` may only contain letters, digits, `_`, `.` and `-`"
                )))
            }
            _ => Ok(()),
        }
    }

    fn with_mode(mode: DataSourceMode) -> Self {
        Self {
            mode,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub log_dir: PathBuf,
}

impl LoggingConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: default_level(),
            log_dir: log_dir.into(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrmConfig {
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl OrmConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.data_source.validate()?;
        Ok(config)
    }
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_foreign_keys() -> bool {
    true
}

fn default_level() -> String {
    default_log_level().to_string()
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DataSourceConfig, DataSourceMode, OrmConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn parses_file_data_source_with_defaults() {
        let config = OrmConfig::from_json_str(
            r#"{"data_source":{"mode":{"kind":"file","path":"/tmp/app.db"}}}"#,
        )
        .expect("file config should parse");

        assert_eq!(
            config.data_source.mode,
            DataSourceMode::File {
                path: PathBuf::from("/tmp/app.db")
            }
        );
        assert_eq!(config.data_source.busy_timeout(), Duration::from_secs(5));
        assert!(config.data_source.foreign_keys);
        assert!(config.logging.is_none());
    }

    #[test]
    fn parses_memory_data_source_and_logging() {
        let config = OrmConfig::from_json_str(
            r#"{
                "data_source": {
                    "mode": {"kind": "memory", "name": "orders"},
                    "busy_timeout_ms": 250,
                    "foreign_keys": false
                },
                "logging": {"level": "warn", "log_dir": "/var/log/app"}
            }"#,
        )
        .expect("memory config should parse");

        assert_eq!(
            config.data_source.mode,
            DataSourceMode::Memory {
                name: Some("orders".to_string())
            }
        );
        assert_eq!(config.data_source.busy_timeout_ms, 250);
        assert!(!config.data_source.foreign_keys);
        let logging = config.logging.expect("logging section");
        assert_eq!(logging.level, "warn");
    }

    #[test]
    fn rejects_empty_file_path() {
        let err = OrmConfig::from_json_str(r#"{"data_source":{"mode":{"kind":"file","path":""}}}"#)
            .expect_err("empty path must be rejected");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_memory_name_that_would_alter_uri() {
        for name in ["orders?mode=rwc", "a&cache=private", "x#frag", "two words"] {
            let err = DataSourceConfig::named_memory(name)
                .validate()
                .expect_err("uri metacharacters must be rejected");
            assert!(matches!(err, ConfigError::Invalid(_)), "{name}");
        }
        assert!(DataSourceConfig::named_memory("orders-2.db_test")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = OrmConfig::from_json_str(r#"{"data_source":{"mode":{"kind":"postgres"}}}"#)
            .expect_err("unknown mode must be rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
