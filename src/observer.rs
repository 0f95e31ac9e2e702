//! Hooks invoked once per accepted triple.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::triple::Triple;

/// Receives every triple the engine accepts, after both halves are buffered.
///
/// Leaving the engine without an observer is the no-op case.
pub trait TripleObserver: Send + Sync {
    fn operate(&self, triple: &Triple);
}

impl<F> TripleObserver for F
where
    F: Fn(&Triple) + Send + Sync,
{
    fn operate(&self, triple: &Triple) {
        self(triple)
    }
}

/// Logs a running count every `cycle` triples.
#[derive(Debug)]
pub struct ProgressObserver {
    cycle: u64,
    count: AtomicU64,
}

impl ProgressObserver {
    pub fn new(cycle: u64) -> Self {
        Self {
            cycle: cycle.max(1),
            count: AtomicU64::new(0),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl TripleObserver for ProgressObserver {
    fn operate(&self, _triple: &Triple) {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if n % self.cycle == 0 {
            tracing::info!(triples = n, "load progress");
        }
    }
}
