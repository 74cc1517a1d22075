//! Readiness wait-set.
//!
//! Consumers register interest, re-check their condition, then wait; the
//! producer signals after every publish. Registration snapshots a signal
//! generation counter, so any signal issued after `register` began makes
//! the subsequent `wait` return immediately. That is the lost-wakeup
//! prevention contract. Waking consumers re-check the condition themselves; spurious
//! wakeups are permitted.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of a [`WaitSet::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// A readiness signal arrived after the token was registered.
    Signaled,
    /// The timeout elapsed with no signal.
    TimedOut,
    /// The wait-set was closed; no further signals will ever arrive.
    Closed,
}

/// Registration snapshot handed out by [`WaitSet::register`].
///
/// A token is consumed by a single `wait`; take a fresh one before every
/// condition re-check.
#[derive(Debug, Clone, Copy)]
pub struct WaitToken {
    generation: u64,
}

#[derive(Debug)]
struct WaitState {
    generation: u64,
    closed: bool,
}

/// Shared readiness primitive for any number of suspended consumers.
#[derive(Debug)]
pub struct WaitSet {
    state: Mutex<WaitState>,
    cond: Condvar,
}

impl WaitSet {
    /// Create an open wait-set with no pending signal.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(WaitState {
                generation: 0,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WaitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register interest. Non-blocking; must be called before the caller
    /// checks its condition.
    pub fn register(&self) -> WaitToken {
        WaitToken {
            generation: self.lock().generation,
        }
    }

    /// Wake all currently registered consumers.
    pub fn notify_all(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        drop(state);
        self.cond.notify_all();
    }

    /// Close the wait-set: every current and future wait returns
    /// [`WaitStatus::Closed`]. Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        drop(state);
        self.cond.notify_all();
    }

    /// True once [`WaitSet::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Suspend until a signal newer than `token`, the timeout, or close.
    ///
    /// `None` waits without a timeout.
    pub fn wait(&self, token: WaitToken, timeout: Option<Duration>) -> WaitStatus {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            if state.closed {
                return WaitStatus::Closed;
            }
            if state.generation != token.generation {
                return WaitStatus::Signaled;
            }
            state = match deadline {
                None => self
                    .cond
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitStatus::TimedOut;
                    }
                    self.cond
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}
