//! The wire-level sample record and its flag bits.
//!
//! A [`SampleRecord`] is the fixed 16-byte unit produced by the generator
//! and handed to consumers through reads. The layout is frozen: consumers
//! parse raw bytes, so field order, widths, and endianness must never
//! change.

use static_assertions::const_assert_eq;

/// Size of one encoded sample record in bytes.
pub const RECORD_SIZE: usize = 16;

/// Set on every generated record.
pub const FLAG_NEW_SAMPLE: u32 = 0x01;

/// Set iff the temperature is strictly above the configured threshold.
pub const FLAG_THRESHOLD_EXCEEDED: u32 = 0x02;

/// One timestamped temperature sample.
///
/// Wire layout (little-endian, no padding):
///
/// | Offset | Size | Field          |
/// |--------|------|----------------|
/// | 0      | 8    | `timestamp_ns` |
/// | 8      | 4    | `temp_mc`      |
/// | 12     | 4    | `flags`        |
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRecord {
    /// Monotonic nanoseconds since the device epoch. Non-decreasing
    /// across records emitted by a single device instance.
    pub timestamp_ns: u64,
    /// Temperature in milli-Celsius.
    pub temp_mc: i32,
    /// Flag bitfield. Bits outside `FLAG_NEW_SAMPLE` and
    /// `FLAG_THRESHOLD_EXCEEDED` are reserved and zero.
    pub flags: u32,
}

const_assert_eq!(core::mem::size_of::<SampleRecord>(), RECORD_SIZE);
const_assert_eq!(core::mem::align_of::<SampleRecord>(), 8);

impl SampleRecord {
    /// Encode into the fixed little-endian wire layout.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[8..12].copy_from_slice(&self.temp_mc.to_le_bytes());
        buf[12..16].copy_from_slice(&self.flags.to_le_bytes());
        buf
    }

    /// Decode from the fixed little-endian wire layout.
    pub fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut ts = [0u8; 8];
        let mut temp = [0u8; 4];
        let mut flags = [0u8; 4];
        ts.copy_from_slice(&buf[0..8]);
        temp.copy_from_slice(&buf[8..12]);
        flags.copy_from_slice(&buf[12..16]);
        Self {
            timestamp_ns: u64::from_le_bytes(ts),
            temp_mc: i32::from_le_bytes(temp),
            flags: u32::from_le_bytes(flags),
        }
    }

    /// True when the NEW_SAMPLE flag is set.
    pub fn is_new(&self) -> bool {
        self.flags & FLAG_NEW_SAMPLE != 0
    }

    /// True when the THRESHOLD_EXCEEDED flag is set.
    pub fn threshold_exceeded(&self) -> bool {
        self.flags & FLAG_THRESHOLD_EXCEEDED != 0
    }
}
