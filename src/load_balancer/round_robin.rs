//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin selector.
/// Stores an internal counter to rotate through backends.
///
/// The counter is a single atomic; `fetch_add` hands every caller a distinct
/// pre-increment value, so N consecutive calls over N backends visit each once.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the cursor at an arbitrary position.
    pub fn starting_at(position: usize) -> Self {
        Self {
            counter: AtomicUsize::new(position),
        }
    }

    /// Advance the cursor and return an index in `0..len`.
    ///
    /// `len` must be non-zero. The counter wraps on overflow and the modulo is
    /// applied on every call, so the index never leaves the pool bounds.
    pub fn next_index(&self, len: usize) -> usize {
        debug_assert!(len > 0, "round-robin over an empty pool");
        self.counter.fetch_add(1, Ordering::Relaxed) % len
    }

    /// Number of selections made so far (modulo `usize::MAX + 1`).
    pub fn position(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }
}
