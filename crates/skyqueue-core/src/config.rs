//! Engine timing configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Durations are real (wall-clock) milliseconds fed through `tick`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use skyqueue_logic::constants::timing;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Slew time between targets (ms).
    pub slew_duration_ms: f64,
    /// Real ms per simulated ms of exposure. 0.0037 turns a 5 minute target
    /// into roughly 1.1 real seconds.
    pub observation_duration_scale: f64,
    /// Pause after each completed target (ms).
    pub inter_target_pause_ms: f64,
    /// Fraction of the gap to the forecast closed on each weather step.
    pub weather_smoothing: f64,
    /// Simulated seconds that pass per real second of a running night.
    pub time_speed: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            slew_duration_ms: timing::SLEW_DURATION_MS,
            observation_duration_scale: timing::OBSERVATION_DURATION_SCALE,
            inter_target_pause_ms: timing::INTER_TARGET_PAUSE_MS,
            weather_smoothing: timing::WEATHER_SMOOTHING,
            time_speed: timing::TIME_SPEED,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("slew_duration_ms", self.slew_duration_ms),
            ("observation_duration_scale", self.observation_duration_scale),
            ("inter_target_pause_ms", self.inter_target_pause_ms),
            ("time_speed", self.time_speed),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is not a non-negative number", value),
                });
            }
        }
        if !(self.weather_smoothing > 0.0 && self.weather_smoothing <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "weather_smoothing",
                reason: format!("{} is outside (0, 1]", self.weather_smoothing),
            });
        }
        Ok(())
    }

    /// Real milliseconds an exposure of `duration_minutes` simulated minutes takes.
    pub fn observation_real_ms(&self, duration_minutes: u32) -> f64 {
        duration_minutes as f64 * 60.0 * 1000.0 * self.observation_duration_scale
    }

    /// Simulated seconds covered by `real_ms` of a running night.
    pub fn simulated_seconds(&self, real_ms: f64) -> f64 {
        real_ms / 1000.0 * self.time_speed
    }
}
