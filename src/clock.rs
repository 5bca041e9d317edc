//! Monotonic time sources used to enforce per-resume budgets.
//!
//! The engine never owns the host's clock; it only asks a [`Clock`] how much
//! time has passed since some fixed origin. [`MonotonicClock`] is backed by
//! [`Instant`], [`ManualClock`] is advanced by hand for offline stepping.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic elapsed-time query.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin. Never decreases.
    fn elapsed(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for deterministic tests and offline stepping.
///
/// Clones share the same time. With [`ManualClock::auto_advance`] every
/// `elapsed()` query also moves time forward, which makes "each unit of work
/// costs N" scenarios reproducible.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
    step_nanos: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that advances by `step` after every query.
    pub fn auto_advance(step: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            step_nanos: duration_nanos(step),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_nanos(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        let now = self.nanos.fetch_add(self.step_nanos, Ordering::SeqCst);
        Duration::from_nanos(now)
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
