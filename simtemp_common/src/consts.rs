//! System-wide constants for the simtemp workspace.
//!
//! Single source of truth for all numeric defaults.
//! Imported by all crates; no duplication permitted.

/// Default producer period in milliseconds.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u32 = 100;

/// Default threshold in milli-Celsius (45.0°C).
pub const DEFAULT_THRESHOLD_MC: i32 = 45_000;

/// Default mean of the generated distribution in milli-Celsius (35.0°C).
pub const DEFAULT_BASE_TEMP_MC: i32 = 35_000;

/// Default half-width of the uniform variation in milli-Celsius (10.0°C).
pub const DEFAULT_VARIATION_MC: i32 = 10_000;

/// Default ring capacity in slots. One slot stays reserved, so the ring
/// holds at most `DEFAULT_RING_CAPACITY - 1` records.
pub const DEFAULT_RING_CAPACITY: usize = 64;

/// Minimum allowed ring capacity in slots.
pub const MIN_RING_CAPACITY: usize = 2;
