//! # Simtemp Device Core
//!
//! A simulated temperature sensor: a periodic producer generates
//! timestamped milli-Celsius samples in the background and delivers them
//! to any number of consumers through a file-descriptor-like reader
//! interface with blocking reads, non-blocking reads, and readiness
//! notification.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌───────────┐   ┌──────────────┐
//! │ Periodic       │──►│ Generator │──►│ Sample Ring  │
//! │ Sampler thread │   └───────────┘   │ (drop-oldest)│
//! └───────┬────────┘                   └──────┬───────┘
//!         │ readiness signal                  │ get()
//!         ▼                                   ▼
//! ┌────────────────┐                   ┌──────────────┐
//! │ Wait-Set       │◄──register/wait───│ SampleReader │──► consumer
//! └────────────────┘                   └──────────────┘
//! ```
//!
//! Readers never synchronize with the generator directly; they observe
//! only the ring and the readiness signal. The producer never waits for
//! consumers: when the ring fills, the oldest unread record is dropped.
//!
//! ## Module Structure
//!
//! - [`ring`] - Bounded FIFO with drop-oldest overflow
//! - [`generator`] - Pure integer sample synthesis
//! - [`waitset`] - Lost-wakeup-free readiness primitive
//! - [`clock`] - Monotonic nanosecond clock
//! - [`reader`] - Blocking/non-blocking reads and poll
//! - [`device`] - Lifecycle: start, open, stop
//! - [`error`] - Error taxonomy at the reader/lifecycle boundary
//!
//! ## Usage
//!
//! ```rust
//! use simtemp_device::{SensorConfig, SimTempDevice};
//!
//! # fn main() -> Result<(), simtemp_device::DeviceError> {
//! let device = SimTempDevice::start(SensorConfig::default())?;
//!
//! let mut reader = device.open(false);
//! let sample = reader.read_sample()?;
//! assert!(sample.is_new());
//!
//! device.stop();
//! assert!(reader.read_sample().is_err());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod device;
pub mod error;
pub mod generator;
pub mod reader;
pub mod ring;
pub mod waitset;

mod sampler;

pub use device::SimTempDevice;
pub use error::{DeviceError, DeviceResult};
pub use reader::{CancelHandle, Readiness, SampleReader};

// Wire-level types are defined once in simtemp_common and re-exported
// here for consumers that only link the device crate.
pub use simtemp_common::config::SensorConfig;
pub use simtemp_common::sample::{
    SampleRecord, FLAG_NEW_SAMPLE, FLAG_THRESHOLD_EXCEEDED, RECORD_SIZE,
};
