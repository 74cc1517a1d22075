//! Consumer-side reader handles.
//!
//! Readers hold no cursor: the FIFO is global, and concurrent readers
//! race for records. A blocking read follows the register-check-wait
//! discipline against the device wait-set, so a record published at any
//! point after registration began is never missed.

use crate::device::DeviceShared;
use crate::error::{DeviceError, DeviceResult};
use crate::waitset::{WaitStatus, WaitToken};
use simtemp_common::sample::{SampleRecord, RECORD_SIZE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a readiness query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one record was buffered at the time of the check.
    Readable,
    /// The ring was empty at the time of the check.
    NotReadable,
}

/// An open reader handle.
///
/// The blocking/non-blocking mode is chosen at [`open`] and fixed for
/// the handle's lifetime. Closing is dropping.
///
/// [`open`]: crate::device::SimTempDevice::open
#[derive(Debug)]
pub struct SampleReader {
    shared: Arc<DeviceShared>,
    nonblocking: bool,
    cancelled: Arc<AtomicBool>,
    registration: Option<WaitToken>,
}

impl SampleReader {
    pub(crate) fn new(shared: Arc<DeviceShared>, nonblocking: bool) -> Self {
        Self {
            shared,
            nonblocking,
            cancelled: Arc::new(AtomicBool::new(false)),
            registration: None,
        }
    }

    /// True when the handle was opened non-blocking.
    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    /// A clonable handle that interrupts this reader's blocking calls.
    ///
    /// Triggering it makes at most one pending (or future) blocking call
    /// fail with [`DeviceError::Interrupted`] without consuming a record,
    /// the user-space rendition of signal delivery.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Read one encoded record (exactly [`RECORD_SIZE`] bytes) into `buf`.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::BufferTooSmall`] when `buf` is shorter than one record
    /// - [`DeviceError::DeviceGone`] once the device is stopped
    /// - [`DeviceError::WouldBlock`] on an empty ring in non-blocking mode
    /// - [`DeviceError::Interrupted`] when a blocking read is cancelled
    pub fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        if buf.len() < RECORD_SIZE {
            return Err(DeviceError::BufferTooSmall { len: buf.len() });
        }
        let record = self.next_record()?;
        buf[..RECORD_SIZE].copy_from_slice(&record.to_bytes());
        Ok(RECORD_SIZE)
    }

    /// Read one record as a typed value. Same semantics as [`read`].
    ///
    /// [`read`]: SampleReader::read
    pub fn read_sample(&mut self) -> DeviceResult<SampleRecord> {
        self.next_record()
    }

    /// Non-blocking readiness check.
    ///
    /// Interest is registered with the wait-set *before* the emptiness
    /// check and retained on the handle, so a record published right
    /// after this returns [`Readiness::NotReadable`] still wakes a
    /// subsequent [`wait_readable`].
    ///
    /// [`wait_readable`]: SampleReader::wait_readable
    pub fn poll(&mut self) -> DeviceResult<Readiness> {
        if self.shared.is_stopped() {
            return Err(DeviceError::DeviceGone);
        }
        let token = self.shared.waitset.register();
        self.registration = Some(token);
        if self.shared.ring.has_data() {
            Ok(Readiness::Readable)
        } else {
            Ok(Readiness::NotReadable)
        }
    }

    /// Suspend until the ring has data, the timeout elapses, the device
    /// stops, or the reader is cancelled.
    ///
    /// Consumes the registration retained by the last [`poll`], if any;
    /// otherwise registers afresh.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::DeviceGone`] once the device is stopped
    /// - [`DeviceError::Interrupted`] when cancelled while waiting
    ///
    /// [`poll`]: SampleReader::poll
    pub fn wait_readable(&mut self, timeout: Duration) -> DeviceResult<Readiness> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shared.is_stopped() {
                return Err(DeviceError::DeviceGone);
            }
            if self.take_cancel() {
                return Err(DeviceError::Interrupted);
            }

            let token = self
                .registration
                .take()
                .unwrap_or_else(|| self.shared.waitset.register());
            if self.shared.ring.has_data() {
                return Ok(Readiness::Readable);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Readiness::NotReadable);
            }
            match self.shared.waitset.wait(token, Some(deadline - now)) {
                WaitStatus::Closed => return Err(DeviceError::DeviceGone),
                WaitStatus::TimedOut => return Ok(Readiness::NotReadable),
                WaitStatus::Signaled => continue,
            }
        }
    }

    fn take_cancel(&self) -> bool {
        self.cancelled.swap(false, Ordering::AcqRel)
    }

    fn cancel_pending(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn next_record(&mut self) -> DeviceResult<SampleRecord> {
        loop {
            if self.shared.is_stopped() {
                return Err(DeviceError::DeviceGone);
            }
            if let Some(record) = self.shared.ring.get() {
                return Ok(record);
            }
            if self.nonblocking {
                return Err(DeviceError::WouldBlock);
            }
            if self.take_cancel() {
                return Err(DeviceError::Interrupted);
            }

            // Interest must be registered before the emptiness re-check:
            // a record published between check and registration would
            // otherwise never wake us.
            let token = self.shared.waitset.register();
            if self.shared.ring.has_data() || self.shared.is_stopped() || self.cancel_pending() {
                continue;
            }

            match self.shared.waitset.wait(token, None) {
                // The stopped flag is re-examined at the top of the loop.
                WaitStatus::Closed => continue,
                WaitStatus::Signaled | WaitStatus::TimedOut => {
                    if !self.shared.ring.has_data() && !self.shared.is_stopped() {
                        // Permitted spurious wakeup: a rival reader won
                        // the race for the record that woke us.
                        debug!("woke without data, re-waiting");
                    }
                }
            }
        }
    }
}

/// Cancellation handle for a [`SampleReader`].
///
/// Clonable and thread-safe; typically wired to a signal handler.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<DeviceShared>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Interrupt the reader's pending (or next) blocking call.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Wake the reader if it is suspended on the wait-set.
        self.shared.waitset.notify_all();
    }
}
