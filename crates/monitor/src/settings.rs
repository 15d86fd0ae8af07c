//! Layered host configuration

use alerting::ForwarderConfig;
use config::{Config, ConfigError, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::MonitorError;

/// Top-level configuration for the monitor binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Classifier and scheduler settings, fixed for the session
    pub dms: DmsConfig,
    pub logging: LoggingConfig,
    pub replay: ReplayConfig,
    pub event_log: EventLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl LoggingConfig {
    /// The configured level, or `None` if it is not a level name
    pub fn max_level(&self) -> Option<Level> {
        self.level.parse().ok()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// JSON-lines landmark recording
    pub path: Option<PathBuf>,
    /// Period of the driving loop (milliseconds), i.e. the frame rate
    pub frame_interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: None,
            frame_interval_ms: 33,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Append events as JSON lines here; log-only when unset
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub forwarder: ForwarderConfig,
}

impl MonitorConfig {
    /// Defaults, then the TOML file (required when given explicitly,
    /// `monitor.toml` if present otherwise), then `DMS_*` environment
    /// variables using `__` between sections.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("monitor").required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("DMS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: MonitorConfig = settings.try_deserialize()?;
        config.dms.validate()?;
        if config.logging.max_level().is_none() {
            return Err(ConfigError::Message(format!(
                "logging.level: unknown level {:?}",
                config.logging.level
            ))
            .into());
        }
        Ok(config)
    }
}
