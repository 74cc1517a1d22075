//! Sensor configuration loading and validation.
//!
//! Configuration is immutable once a device has started. Defaults cover
//! every field, so a device can start with no file at all; when a TOML
//! file is supplied, unknown fields are rejected and semantic validation
//! runs before the config is handed out.
//!
//! # TOML Example
//!
//! ```toml
//! sampling_interval_ms = 50
//! threshold_mc = 30000
//! base_temp_mc = 25000
//! variation_mc = 5000
//! ring_capacity = 128
//! ```

use crate::consts::{
    DEFAULT_BASE_TEMP_MC, DEFAULT_RING_CAPACITY, DEFAULT_SAMPLING_INTERVAL_MS,
    DEFAULT_THRESHOLD_MC, DEFAULT_VARIATION_MC, MIN_RING_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Simulated sensor configuration.
///
/// All fields default to the values in [`crate::consts`]; a partial TOML
/// file only needs to name the fields it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Producer period in milliseconds. Must be positive.
    pub sampling_interval_ms: u32,

    /// Threshold in milli-Celsius for the THRESHOLD_EXCEEDED flag
    /// (strictly-greater comparison).
    pub threshold_mc: i32,

    /// Mean of the generated distribution in milli-Celsius.
    pub base_temp_mc: i32,

    /// Half-width of the uniform variation in milli-Celsius.
    /// Generated temperatures stay in `[base - variation, base + variation]`.
    pub variation_mc: i32,

    /// Ring capacity in slots; must be a power of two, at least
    /// [`MIN_RING_CAPACITY`]. The ring holds at most `ring_capacity - 1`
    /// records.
    pub ring_capacity: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            threshold_mc: DEFAULT_THRESHOLD_MC,
            base_temp_mc: DEFAULT_BASE_TEMP_MC,
            variation_mc: DEFAULT_VARIATION_MC,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl SensorConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FileNotFound`] if the file does not exist
    /// - [`ConfigError::ParseError`] if the TOML syntax is invalid
    /// - [`ConfigError::ValidationError`] if semantic validation fails
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `sampling_interval_ms` is zero
    /// - `variation_mc` is negative
    /// - `base_temp_mc ± variation_mc` leaves the `i32` range
    /// - `ring_capacity` is below [`MIN_RING_CAPACITY`] or not a power of two
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "sampling_interval_ms must be positive".to_string(),
            ));
        }

        if self.variation_mc < 0 {
            return Err(ConfigError::ValidationError(format!(
                "variation_mc must be non-negative, got {}",
                self.variation_mc
            )));
        }

        // Range bounds are computed in i64 so the check itself cannot wrap.
        let hi = self.base_temp_mc as i64 + self.variation_mc as i64;
        let lo = self.base_temp_mc as i64 - self.variation_mc as i64;
        if hi > i32::MAX as i64 || lo < i32::MIN as i64 {
            return Err(ConfigError::ValidationError(format!(
                "temperature range [{lo}, {hi}] mC leaves the 32-bit range"
            )));
        }

        if self.ring_capacity < MIN_RING_CAPACITY || !self.ring_capacity.is_power_of_two() {
            return Err(ConfigError::ValidationError(format!(
                "ring_capacity must be a power of two >= {MIN_RING_CAPACITY}, got {}",
                self.ring_capacity
            )));
        }

        Ok(())
    }

    /// Lowest temperature the generator can produce, in milli-Celsius.
    pub fn min_temp_mc(&self) -> i32 {
        self.base_temp_mc - self.variation_mc
    }

    /// Highest temperature the generator can produce, in milli-Celsius.
    pub fn max_temp_mc(&self) -> i32 {
        self.base_temp_mc + self.variation_mc
    }
}
