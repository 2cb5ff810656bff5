//! Player configuration loaded from YAML.
//!
//! The player reads `tickreel.yaml` from the working directory unless told
//! otherwise. Every field has a default, so an empty file (or no file at
//! all) yields a working configuration.
//!
//! ```yaml
//! playback:
//!   speed_factor: 1.0
//!   speed_step: 1.0
//!   speed_scale: additive
//! logging:
//!   level: info
//!   json: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level player configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Playback speed settings.
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlayerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.playback.validate()?;
        Ok(config)
    }
}

/// How [`increase_speed`](crate::Spooler::increase_speed) and
/// [`decrease_speed`](crate::Spooler::decrease_speed) combine the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedScale {
    /// `s + by` / `s - by`.
    #[default]
    Additive,
    /// `s * by` / `s / by`.
    Multiplicative,
}

impl SpeedScale {
    /// Speed after increasing `current` by `by`.
    pub const fn increase(self, current: f64, by: f64) -> f64 {
        match self {
            Self::Additive => current + by,
            Self::Multiplicative => current * by,
        }
    }

    /// Speed after decreasing `current` by `by`.
    pub const fn decrease(self, current: f64, by: f64) -> f64 {
        match self {
            Self::Additive => current - by,
            Self::Multiplicative => current / by,
        }
    }
}

/// Playback speed settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlaybackConfig {
    /// Initial speed factor; one step lasts `1 / speed_factor` seconds.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Default delta for speed increases and decreases.
    #[serde(default = "default_speed_step")]
    pub speed_step: f64,

    /// How speed deltas are combined with the current factor.
    #[serde(default)]
    pub speed_scale: SpeedScale,
}

impl PlaybackConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.speed_factor) {
            return Err(ConfigError::Invalid {
                field: "playback.speed_factor",
                reason: format!("{} is not a positive number", self.speed_factor),
            });
        }
        if !is_positive(self.speed_step) {
            return Err(ConfigError::Invalid {
                field: "playback.speed_step",
                reason: format!("{} is not a positive number", self.speed_step),
            });
        }
        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_factor: default_speed_factor(),
            speed_step: default_speed_step(),
            speed_scale: SpeedScale::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

pub(crate) const fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

const fn default_speed_factor() -> f64 {
    1.0
}

const fn default_speed_step() -> f64 {
    1.0
}

fn default_log_level() -> String {
    String::from("info")
}
