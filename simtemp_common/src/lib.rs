//! Simtemp Common Library
//!
//! This crate provides the shared leaf types for the simtemp workspace:
//! the wire-level sample record, system-wide constants, and configuration
//! loading with validation.
//!
//! # Module Structure
//!
//! - [`sample`] - The 16-byte sample record and flag bits
//! - [`config`] - Sensor configuration with TOML loading and validation
//! - [`consts`] - System-wide default constants
//!
//! # Usage
//!
//! ```rust
//! use simtemp_common::config::SensorConfig;
//! use simtemp_common::sample::{SampleRecord, FLAG_NEW_SAMPLE};
//!
//! let cfg = SensorConfig::default();
//! assert_eq!(cfg.sampling_interval_ms, 100);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod consts;
pub mod sample;

pub use config::{ConfigError, SensorConfig};
pub use sample::{
    SampleRecord, FLAG_NEW_SAMPLE, FLAG_THRESHOLD_EXCEEDED, RECORD_SIZE,
};
