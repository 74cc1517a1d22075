//! Sample synthesis.
//!
//! Pure integer arithmetic: one uniform 32-bit draw is folded into
//! `[-variation, +variation]` and added to the configured base. No
//! floating point anywhere in the sample path.

use rand::RngCore;
use simtemp_common::config::SensorConfig;
use simtemp_common::sample::{SampleRecord, FLAG_NEW_SAMPLE, FLAG_THRESHOLD_EXCEEDED};

/// Produce the next sample for a validated configuration.
///
/// `timestamp_ns` is the current monotonic-clock value. The temperature
/// is uniform over `[base - variation, base + variation]`; the threshold
/// comparison is strictly greater-than, so equality does not set the
/// flag. Intermediates are `i64`, and config validation has already
/// guaranteed the result fits `i32`.
pub fn generate(cfg: &SensorConfig, timestamp_ns: u64, rng: &mut dyn RngCore) -> SampleRecord {
    let variation = cfg.variation_mc as i64;
    let span = 2 * variation + 1;
    let jitter = (rng.next_u32() as i64) % span - variation;
    let temp_mc = (cfg.base_temp_mc as i64 + jitter) as i32;

    let mut flags = FLAG_NEW_SAMPLE;
    if temp_mc > cfg.threshold_mc {
        flags |= FLAG_THRESHOLD_EXCEEDED;
    }

    SampleRecord {
        timestamp_ns,
        temp_mc,
        flags,
    }
}
