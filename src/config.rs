//! Selector configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no
//! file at all) yields a usable configuration.
//!
//! ```
//! use u_select::config::SelectorConfig;
//! use std::time::Duration;
//!
//! let config = SelectorConfig::from_toml_str(r#"
//!     model_name = "weekly_plan"
//!     time_limit_ms = 2000
//!
//!     [logging]
//!     level = "debug"
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_millis(2000)));
//! assert_eq!(config.logging.level, "debug");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lp::DEFAULT_MODEL_NAME;

/// Default wall-clock limit for one solve.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 30_000;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Selector configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SelectorConfig {
    /// Name given to the built model (appears in logs).
    pub model_name: String,

    /// Wall-clock limit for one solve. `None` runs to completion.
    pub time_limit_ms: Option<u64>,

    /// Distance from an integer within which solver values are snapped.
    pub integrality_tolerance: f64,

    /// Logging setup, applied by [`crate::logging::init`].
    pub logging: LoggingConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            time_limit_ms: Some(DEFAULT_TIME_LIMIT_MS),
            integrality_tolerance: 1e-6,
            logging: LoggingConfig::default(),
        }
    }
}

impl SelectorConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, is not valid TOML, or holds
    /// out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::Invalid("model_name must not be empty".into()));
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "time_limit_ms must be positive".into(),
            ));
        }
        if !(self.integrality_tolerance > 0.0 && self.integrality_tolerance < 0.5) {
            return Err(ConfigError::Invalid(format!(
                "integrality_tolerance must be in (0, 0.5), got {}",
                self.integrality_tolerance
            )));
        }
        Ok(())
    }

    /// Sets the solve time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    /// Removes the solve time limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    /// Sets the model name.
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Sets the integrality tolerance.
    pub fn with_integrality_tolerance(mut self, tolerance: f64) -> Self {
        self.integrality_tolerance = tolerance;
        self
    }

    /// Returns the solve time limit, if configured.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `"info"`, `"u_select=debug"`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Colored output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}
