//! Tick sources.
//!
//! The engine only ever wants "time advanced by Δ since last call". In
//! production that comes from [`DeltaClock`] sampled on an interval; in tests
//! and simulations from [`FixedTicks`].

use std::time::Duration;

use tokio::time::Instant;

/// Monotonic lap clock.
///
/// Built on `tokio::time::Instant` so paused-time tests drive it too.
#[derive(Debug, Clone)]
pub struct DeltaClock {
    last: Instant,
}

impl DeltaClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time from the previous lap (or restart) to `now`, then start a new
    /// lap there. `now` is usually the instant returned by `Interval::tick`;
    /// instants older than the last lap yield zero.
    pub fn lap_at(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last);
        if now > self.last {
            self.last = now;
        }
        delta
    }

    /// Forget the time accumulated since the last lap.
    pub fn restart(&mut self) {
        self.last = Instant::now();
    }
}

impl Default for DeltaClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn as_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Lazy, infinite sequence of identical deltas.
#[derive(Debug, Clone, Copy)]
pub struct FixedTicks {
    delta: Duration,
}

impl FixedTicks {
    pub fn new(delta: Duration) -> Self {
        Self { delta }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Iterator for FixedTicks {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.delta)
    }
}
