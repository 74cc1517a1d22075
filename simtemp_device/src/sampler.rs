//! Periodic sample producer.
//!
//! One dedicated thread generates a record every `sampling_interval_ms`,
//! enqueues it, and then signals readiness, so a consumer woken by the
//! signal observes at least one record (unless a rival consumer drains
//! it first). Ticks are scheduled on an absolute timeline: the next
//! tick is anchored to the ideal previous instant, not the actual firing
//! time, so lateness never accumulates.
//!
//! With the `rt` feature the loop paces itself with
//! `clock_nanosleep(TIMER_ABSTIME)` on `CLOCK_MONOTONIC`; the default
//! build waits on a condvar with an absolute deadline, which also lets
//! `stop` interrupt the sleep promptly.

use crate::device::DeviceShared;
use crate::generator::generate;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::debug;

// ─── Tick statistics ────────────────────────────────────────────────

/// Per-device producer counters, updated every tick without allocation.
#[derive(Debug, Default)]
pub(crate) struct SamplerStats {
    produced: AtomicU64,
    overruns: AtomicU64,
    max_lateness_ns: AtomicU64,
}

impl SamplerStats {
    pub(crate) fn produced(&self) -> u64 {
        self.produced.load(Ordering::Relaxed)
    }

    pub(crate) fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub(crate) fn max_lateness_ns(&self) -> u64 {
        self.max_lateness_ns.load(Ordering::Relaxed)
    }

    fn note_tick(&self, lateness_ns: u64, interval_ns: u64) {
        self.produced.fetch_add(1, Ordering::Relaxed);
        self.max_lateness_ns
            .fetch_max(lateness_ns, Ordering::Relaxed);
        if lateness_ns > interval_ns {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            debug!(lateness_ns, "tick overrun");
        }
    }
}

// ─── Stop signal ────────────────────────────────────────────────────

/// Condvar-backed flag that can interrupt an absolute-deadline sleep.
#[derive(Debug, Default)]
struct StopSignal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn raise(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    #[cfg(feature = "rt")]
    fn is_raised(&self) -> bool {
        *self.lock()
    }

    /// Sleep until `deadline` or until raised. Returns true when raised.
    #[cfg_attr(feature = "rt", allow(dead_code))]
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut raised = self.lock();
        loop {
            if *raised {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            raised = self
                .cond
                .wait_timeout(raised, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

// ─── Producer thread ────────────────────────────────────────────────

/// Owning handle for the producer thread.
#[derive(Debug)]
pub(crate) struct SamplerHandle {
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Spawn the producer. Emission starts immediately; the first record
    /// lands one interval after this call returns.
    pub(crate) fn spawn(shared: Arc<DeviceShared>) -> io::Result<Self> {
        let stop = Arc::new(StopSignal::default());
        let thread = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("simtemp-sampler".to_string())
                .spawn(move || run(&shared, &stop))?
        };
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Prevent further ticks and wait for an in-flight tick to finish.
    pub(crate) fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.stop.raise();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

/// One tick: generate → enqueue → signal readiness, in that order.
fn tick(shared: &DeviceShared, rng: &mut SmallRng) {
    let record = generate(&shared.config, shared.clock.now_ns(), rng);
    shared.ring.put(record);
    shared.waitset.notify_all();
}

#[cfg(not(feature = "rt"))]
fn run(shared: &DeviceShared, stop: &StopSignal) {
    use std::time::Duration;

    let interval = Duration::from_millis(u64::from(shared.config.sampling_interval_ms));
    let interval_ns = interval.as_nanos() as u64;
    let mut rng = SmallRng::from_entropy();

    debug!(
        interval_ms = shared.config.sampling_interval_ms,
        "sampler running"
    );

    let mut next_tick = Instant::now() + interval;
    loop {
        if stop.wait_until(next_tick) {
            break;
        }
        let lateness = Instant::now().saturating_duration_since(next_tick);
        tick(shared, &mut rng);
        shared
            .stats
            .note_tick(lateness.as_nanos() as u64, interval_ns);
        // Anchor to the ideal schedule; a late tick does not push the
        // timeline back.
        next_tick += interval;
    }

    debug!(produced = shared.stats.produced(), "sampler stopped");
}

#[cfg(feature = "rt")]
fn run(shared: &DeviceShared, stop: &StopSignal) {
    use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

    let clock = ClockId::CLOCK_MONOTONIC;
    let interval_ns = i64::from(shared.config.sampling_interval_ms) * 1_000_000;
    let mut rng = SmallRng::from_entropy();

    debug!(
        interval_ms = shared.config.sampling_interval_ms,
        "sampler running (rt pacing)"
    );

    let mut next_wake = match clock_gettime(clock) {
        Ok(now) => now,
        Err(e) => {
            tracing::error!("clock_gettime failed: {e}; sampler exiting");
            return;
        }
    };

    loop {
        next_wake = timespec_add_ns(next_wake, interval_ns);
        let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        if stop.is_raised() {
            break;
        }
        let lateness_ns = clock_gettime(clock)
            .map(|now| timespec_diff_ns(&now, &next_wake).max(0) as u64)
            .unwrap_or(0);
        tick(shared, &mut rng);
        shared.stats.note_tick(lateness_ns, interval_ns as u64);
    }

    debug!(produced = shared.stats.produced(), "sampler stopped");
}

// ─── Time helpers (rt pacing) ───────────────────────────────────────

/// Add nanoseconds to a TimeSpec, normalizing the nanosecond field.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
