//! Daemon configuration
//!
//! Read from a YAML file; every key is optional and falls back to its
//! default.
//!
//! ```yaml
//! amc:
//!   polling_interval_sec: 10
//!   heartbeat_send_timeout_sec: 10
//!   cbsd_inactivity_timeout_sec: 14400
//! db:
//!   uri: mongodb://127.0.0.1:27017/dp
//! logger:
//!   level: info
//! ```

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmcSection {
    pub polling_interval_sec: i64,
    pub heartbeat_send_timeout_sec: i64,
    pub cbsd_inactivity_timeout_sec: i64,
}

impl Default for AmcSection {
    fn default() -> Self {
        AmcSection {
            polling_interval_sec: 10,
            heartbeat_send_timeout_sec: 10,
            cbsd_inactivity_timeout_sec: 4 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSection {
    pub uri: String,
}

impl Default for DbSection {
    fn default() -> Self {
        DbSection {
            uri: "mongodb://127.0.0.1:27017/dp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerSection {
    pub level: String,
}

impl Default for LoggerSection {
    fn default() -> Self {
        LoggerSection {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmcConfig {
    pub amc: AmcSection,
    pub db: DbSection,
    pub logger: LoggerSection,
}

impl AmcConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("amc.polling_interval_sec", self.amc.polling_interval_sec),
            ("amc.heartbeat_send_timeout_sec", self.amc.heartbeat_send_timeout_sec),
            ("amc.cbsd_inactivity_timeout_sec", self.amc.cbsd_inactivity_timeout_sec),
        ];
        for (key, value) in durations {
            if value <= 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must be positive, got {value}"
                )));
            }
        }
        if self.db.uri.is_empty() {
            return Err(ConfigError::ValidationError("db.uri is empty".to_string()));
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.amc.polling_interval_sec.max(0) as u64)
    }

    pub fn heartbeat_timeout(&self) -> TimeDelta {
        TimeDelta::seconds(self.amc.heartbeat_send_timeout_sec)
    }

    pub fn inactivity_timeout(&self) -> TimeDelta {
        TimeDelta::seconds(self.amc.cbsd_inactivity_timeout_sec)
    }
}
