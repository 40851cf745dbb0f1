#![forbid(unsafe_code)]

//! Clocks.
//!
//! The engine reads time only through [`Clock`], so it runs the same on
//! native targets, in the browser (via `web-time`), and under deterministic
//! tests with [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use web_time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock {
    /// Monotonic instant for measuring durations and deadlines.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch, comparable across tabs.
    fn wall_millis(&self) -> u64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same timeline, so a test can hand one clone to the
/// engine and keep another to advance time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: u64,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Start a timeline at the current instant with the given wall time.
    #[must_use]
    pub fn new(wall_origin_millis: u64) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin: wall_origin_millis,
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Move time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_700_000_000_000)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn wall_millis(&self) -> u64 {
        self.wall_origin + u64::try_from(self.elapsed.get().as_millis()).unwrap_or(u64::MAX)
    }
}
