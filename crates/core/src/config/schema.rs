//! Configuration schema definitions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Permission polling and position watching
    #[serde(default)]
    pub location: LocationConfig,

    /// Arrival radius tuning
    #[serde(default)]
    pub arrival: ArrivalConfig,

    /// Logging output
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl ConfigSchema {
    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<()> {
        self.location.validate()?;
        self.arrival.validate()
    }
}

/// Accuracy tier requested from the platform location provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    /// Roughly 3 km
    Lowest,
    /// Roughly 1 km
    Low,
    /// Roughly 100 m
    Balanced,
    /// Roughly 10 m
    High,
    /// Best the device offers
    Highest,
    /// Highest accuracy plus sensor fusion, for turn-by-turn use
    #[default]
    BestForNavigation,
}

/// Location status monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Interval between permission/service re-checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Accuracy tier for the continuous watch
    #[serde(default)]
    pub accuracy: AccuracyTier,

    /// Minimum movement before the provider reports a new position
    #[serde(default = "default_distance_interval_m")]
    pub distance_interval_m: f64,

    /// Minimum time between reported positions
    #[serde(default = "default_time_interval_ms")]
    pub time_interval_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            accuracy: AccuracyTier::default(),
            distance_interval_m: default_distance_interval_m(),
            time_interval_ms: default_time_interval_ms(),
        }
    }
}

impl LocationConfig {
    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_config_value(
                "location.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.distance_interval_m.is_nan() || self.distance_interval_m < 0.0 {
            return Err(Error::invalid_config_value(
                "location.distance_interval_m",
                format!("{} is not a non-negative distance", self.distance_interval_m),
            ));
        }
        Ok(())
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_distance_interval_m() -> f64 {
    5.0
}

fn default_time_interval_ms() -> u64 {
    3000
}

/// Arrival detection configuration
///
/// The arrival radius is `max(accuracy * accuracy_multiplier, min_threshold_m)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArrivalConfig {
    /// Multiplier applied to the reported accuracy radius
    #[serde(default = "default_accuracy_multiplier")]
    pub accuracy_multiplier: f64,

    /// Floor for the arrival radius in meters
    #[serde(default = "default_min_threshold_m")]
    pub min_threshold_m: f64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            accuracy_multiplier: default_accuracy_multiplier(),
            min_threshold_m: default_min_threshold_m(),
        }
    }
}

impl ArrivalConfig {
    fn validate(&self) -> Result<()> {
        if self.accuracy_multiplier.is_nan() || self.accuracy_multiplier < 0.0 {
            return Err(Error::invalid_config_value(
                "arrival.accuracy_multiplier",
                format!("{} is not a non-negative factor", self.accuracy_multiplier),
            ));
        }
        if self.min_threshold_m.is_nan() || self.min_threshold_m < 0.0 {
            return Err(Error::invalid_config_value(
                "arrival.min_threshold_m",
                format!("{} is not a non-negative distance", self.min_threshold_m),
            ));
        }
        Ok(())
    }
}

fn default_accuracy_multiplier() -> f64 {
    2.0
}

fn default_min_threshold_m() -> f64 {
    30.0
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for a log file, stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
