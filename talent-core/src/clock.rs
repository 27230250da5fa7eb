//! A small injectable clock, so correlator/context code never calls
//! `SystemTime::now()` directly and tests can supply deterministic times.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in milliseconds since epoch.
pub trait Clock: Send + Sync {
    /// The current time, ms since epoch.
    fn now_ms(&self) -> i64;
}

/// The real wall-clock, backed by `SystemTime::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
    }
}

/// A fixed or steppable clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now_ms: std::sync::atomic::AtomicI64,
}

impl FixedClock {
    /// A clock that starts at `now_ms`.
    pub fn new(now_ms: i64) -> Arc<Self> {
        Arc::new(Self { now_ms: std::sync::atomic::AtomicI64::new(now_ms) })
    }

    /// Advance (or rewind) the clock by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
    }
}
