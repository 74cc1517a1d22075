//! Bounded sample FIFO with drop-oldest overflow.
//!
//! One internal lock protects the indices and storage. Critical sections
//! copy at most one 16-byte record and never allocate, so the producer can
//! call [`SampleRing::put`] from its tick without ever blocking on a
//! consumer for longer than that bounded copy.

use simtemp_common::sample::SampleRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Bounded FIFO of [`SampleRecord`]s.
///
/// Capacity is a power of two; one slot stays reserved so `head == tail`
/// means empty and `(head + 1) & mask == tail` means full. The valid
/// window runs from `tail` (inclusive, oldest) to `head` (exclusive).
/// When full, `put` advances `tail` first, discarding the oldest unread
/// record under the same lock so consumers never observe a half-consistent
/// window.
#[derive(Debug)]
pub struct SampleRing {
    inner: Mutex<RingState>,
    mask: usize,
}

#[derive(Debug)]
struct RingState {
    slots: Box<[SampleRecord]>,
    head: usize,
    tail: usize,
    overflows: u64,
}

const EMPTY_SLOT: SampleRecord = SampleRecord {
    timestamp_ns: 0,
    temp_mc: 0,
    flags: 0,
};

impl SampleRing {
    /// Create an empty ring with `capacity` slots.
    ///
    /// `capacity` must be a power of two, at least 2; configuration
    /// validation enforces this before a ring is built.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= 2);
        Self {
            inner: Mutex::new(RingState {
                slots: vec![EMPTY_SLOT; capacity].into_boxed_slice(),
                head: 0,
                tail: 0,
                overflows: 0,
            }),
            mask: capacity - 1,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        // The critical sections cannot panic, so a poisoned lock still
        // guards consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, discarding the oldest one when full.
    ///
    /// Never fails and never blocks beyond the bounded critical section.
    pub fn put(&self, record: SampleRecord) {
        let mut state = self.lock();
        let next_head = (state.head + 1) & self.mask;
        if next_head == state.tail {
            state.tail = (state.tail + 1) & self.mask;
            state.overflows += 1;
        }
        let head = state.head;
        state.slots[head] = record;
        state.head = next_head;
    }

    /// Remove and return the oldest record, or `None` when empty.
    pub fn get(&self) -> Option<SampleRecord> {
        let mut state = self.lock();
        if state.head == state.tail {
            return None;
        }
        let record = state.slots[state.tail];
        state.tail = (state.tail + 1) & self.mask;
        Some(record)
    }

    /// True when at least one record is buffered.
    pub fn has_data(&self) -> bool {
        let state = self.lock();
        state.head != state.tail
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.head.wrapping_sub(state.tail) & self.mask
    }

    /// True when no records are buffered.
    pub fn is_empty(&self) -> bool {
        !self.has_data()
    }

    /// Number of slots, including the reserved one.
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Records discarded by drop-oldest since construction.
    pub fn overflow_count(&self) -> u64 {
        self.lock().overflows
    }
}
