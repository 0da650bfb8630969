//! Time utilities for thermod
//!
//! Polling deadlines and request ages use monotonic time; the temperature
//! log and IPC event timestamps use the wall clock.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Current local wall-clock time
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Seconds since the unix epoch
pub fn unix_time() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Monotonic instant, immune to wall-clock changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Time since `earlier`, zero if `earlier` is actually later
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}
