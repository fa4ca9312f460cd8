//! Engine configuration.

use std::path::Path;

use serde::Deserialize;

/// Error loading a [`RaptorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for this struct
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration parameters for the round-based engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaptorConfig {
    /// Minimum time to change platforms within one stop point (seconds).
    pub min_transfer_secs: u32,

    /// Default pedestrian speed (m/s).
    pub walking_speed: f64,

    /// Speed at which footpath durations were computed (m/s).
    /// Durations are rescaled to the requested walking speed.
    pub footpath_reference_speed: f64,

    /// Longest footpath considered (metres).
    pub max_walking_distance: u32,

    /// Prune labels against the best destination time found so far.
    pub global_pruning: bool,

    /// Round ceiling. Reaching it means a scan failed to converge.
    pub max_rounds: usize,
}

impl RaptorConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        min_transfer_secs: u32,
        walking_speed: f64,
        footpath_reference_speed: f64,
        max_walking_distance: u32,
        global_pruning: bool,
        max_rounds: usize,
    ) -> Self {
        Self {
            min_transfer_secs,
            walking_speed,
            footpath_reference_speed,
            max_walking_distance,
            global_pruning,
            max_rounds,
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.walking_speed.is_finite() && self.walking_speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "walking_speed must be positive, got {}",
                self.walking_speed
            )));
        }
        if !(self.footpath_reference_speed.is_finite() && self.footpath_reference_speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "footpath_reference_speed must be positive, got {}",
                self.footpath_reference_speed
            )));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for RaptorConfig {
    fn default() -> Self {
        Self {
            min_transfer_secs: 120,
            walking_speed: 1.12,
            footpath_reference_speed: 1.12,
            max_walking_distance: 1000,
            global_pruning: true,
            max_rounds: 32,
        }
    }
}
