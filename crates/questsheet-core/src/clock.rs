//! Time sources for key timestamps.
//!
//! Encoding reads "now" through a [`Clock`] instead of the global wall clock,
//! so tests can pin timestamps and the store can guarantee unique keys.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of millisecond timestamps since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall clock. Readings before the epoch are clamped to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Always returns the same reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Wraps another clock and never returns the same reading twice.
///
/// If the inner clock has not advanced past the last reading (same
/// millisecond, or it stepped backwards), the last reading plus one is
/// returned instead. Readings saturate at `u64::MAX`: once there, the clock
/// keeps returning `u64::MAX`, and the store reports the resulting key
/// collision as `KeyExists`.
#[derive(Debug, Default)]
pub struct MonotonicClock<C> {
    inner: C,
    last: AtomicU64,
}

impl<C: Clock> MonotonicClock<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: AtomicU64::new(0),
        }
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now_millis(&self) -> u64 {
        let now = self.inner.now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = if now > last { now } else { last.saturating_add(1) };
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}
