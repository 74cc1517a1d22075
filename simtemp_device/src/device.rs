//! Device lifecycle and shared state.
//!
//! A [`SimTempDevice`] owns the ring, the readiness wait-set, the clock,
//! and the producer thread. Reader handles share that state through an
//! `Arc`, so a handle stays valid for its entire lifetime regardless of
//! when the device is stopped; storage is released once the device and
//! every handle are gone.

use crate::clock::MonotonicClock;
use crate::error::{DeviceError, DeviceResult};
use crate::reader::SampleReader;
use crate::ring::SampleRing;
use crate::sampler::{SamplerHandle, SamplerStats};
use crate::waitset::WaitSet;
use simtemp_common::config::SensorConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// State shared between the device, the producer thread, and all readers.
#[derive(Debug)]
pub(crate) struct DeviceShared {
    pub(crate) config: SensorConfig,
    pub(crate) ring: SampleRing,
    pub(crate) waitset: WaitSet,
    pub(crate) clock: MonotonicClock,
    pub(crate) stopped: AtomicBool,
    pub(crate) stats: SamplerStats,
}

impl DeviceShared {
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// A running simulated temperature sensor.
///
/// Created by [`SimTempDevice::start`]; emission begins immediately and
/// continues until [`SimTempDevice::stop`] (or drop). Multiple devices
/// may run concurrently in one process.
#[derive(Debug)]
pub struct SimTempDevice {
    shared: Arc<DeviceShared>,
    sampler: Mutex<Option<SamplerHandle>>,
}

impl SimTempDevice {
    /// Validate `config`, allocate the ring, and start the producer.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::InvalidConfig`] when validation rejects the config
    /// - [`DeviceError::ResourceUnavailable`] when the producer thread
    ///   cannot be spawned
    pub fn start(config: SensorConfig) -> DeviceResult<Self> {
        config.validate().map_err(|e| DeviceError::InvalidConfig {
            reason: e.to_string(),
        })?;

        let shared = Arc::new(DeviceShared {
            ring: SampleRing::new(config.ring_capacity),
            waitset: WaitSet::new(),
            clock: MonotonicClock::new(),
            stopped: AtomicBool::new(false),
            stats: SamplerStats::default(),
            config,
        });

        let sampler = SamplerHandle::spawn(Arc::clone(&shared))?;

        info!(
            interval_ms = shared.config.sampling_interval_ms,
            ring_capacity = shared.config.ring_capacity,
            "simtemp device started"
        );

        Ok(Self {
            shared,
            sampler: Mutex::new(Some(sampler)),
        })
    }

    /// Open a reader handle. Any number of readers may coexist; they all
    /// drain the same global FIFO.
    pub fn open(&self, nonblocking: bool) -> SampleReader {
        SampleReader::new(Arc::clone(&self.shared), nonblocking)
    }

    /// Stop the device: no further ticks after this returns, and every
    /// suspended reader wakes into [`DeviceError::DeviceGone`].
    ///
    /// Idempotent, and safe with readers still holding open handles;
    /// their subsequent reads and polls fail with `DeviceGone`.
    pub fn stop(&self) {
        let was_stopped = self.shared.stopped.swap(true, Ordering::SeqCst);

        // The producer goes down first so the terminal signal is really
        // terminal: nothing is enqueued after it.
        let sampler = self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sampler) = sampler {
            sampler.stop();
        }

        self.shared.waitset.close();

        if !was_stopped {
            info!(
                produced = self.shared.stats.produced(),
                overflows = self.shared.ring.overflow_count(),
                "simtemp device stopped"
            );
        }
    }

    /// True once [`SimTempDevice::stop`] has run.
    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// The immutable configuration this device started with.
    pub fn config(&self) -> &SensorConfig {
        &self.shared.config
    }

    /// Records the producer has emitted so far.
    pub fn produced_count(&self) -> u64 {
        self.shared.stats.produced()
    }

    /// Records discarded by drop-oldest overflow so far.
    pub fn overflow_count(&self) -> u64 {
        self.shared.ring.overflow_count()
    }

    /// Ticks that fired more than one interval late.
    pub fn overrun_count(&self) -> u64 {
        self.shared.stats.overruns()
    }

    /// Worst observed tick lateness in nanoseconds.
    pub fn max_lateness_ns(&self) -> u64 {
        self.shared.stats.max_lateness_ns()
    }
}

impl Drop for SimTempDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_rejects_invalid_config() {
        let cfg = SensorConfig {
            sampling_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            SimTempDevice::start(cfg),
            Err(DeviceError::InvalidConfig { .. })
        ));

        let cfg = SensorConfig {
            ring_capacity: 48,
            ..Default::default()
        };
        assert!(matches!(
            SimTempDevice::start(cfg),
            Err(DeviceError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn stop_is_idempotent() {
        let device = SimTempDevice::start(SensorConfig::default()).unwrap();
        device.stop();
        device.stop();
        assert!(device.is_stopped());
    }

    #[test]
    fn two_devices_run_independently() {
        let a = SimTempDevice::start(SensorConfig::default()).unwrap();
        let b = SimTempDevice::start(SensorConfig {
            sampling_interval_ms: 10,
            ..Default::default()
        }).unwrap();

        a.stop();
        // Stopping one device must not affect the other.
        assert!(!b.is_stopped());
        let mut reader = b.open(false);
        assert!(reader.read_sample().is_ok());
        b.stop();
    }
}
