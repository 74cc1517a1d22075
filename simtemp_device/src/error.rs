//! Error types for device operations.

use simtemp_common::sample::RECORD_SIZE;
use thiserror::Error;

/// Errors surfaced at the reader and lifecycle boundaries.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Destination buffer cannot hold one full record.
    #[error("destination buffer too small: {len} bytes, need {RECORD_SIZE}")]
    BufferTooSmall {
        /// Length of the buffer the caller supplied.
        len: usize,
    },

    /// Non-blocking read found the ring empty.
    #[error("no sample available")]
    WouldBlock,

    /// A blocking call was cancelled before a record arrived.
    #[error("operation interrupted")]
    Interrupted,

    /// The device was stopped; the handle will never yield data again.
    #[error("device stopped")]
    DeviceGone,

    /// Configuration rejected at start.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable rejection reason.
        reason: String,
    },

    /// The producer thread (or another runtime resource) could not be
    /// created.
    #[error("resource unavailable: {source}")]
    ResourceUnavailable {
        /// Underlying OS error.
        #[from]
        source: std::io::Error,
    },
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
