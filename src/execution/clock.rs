//! Time Source for the Driver
//!
//! The driver measures pause deadlines and sleeps between polls through
//! [`Clock`]. [`SystemClock`] is real monotonic time; [`ManualClock`] is
//! virtual time, where `sleep` advances the clock and fires any actions
//! scheduled for that moment.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Monotonic time since the clock's origin.
    fn now(&self) -> Duration;

    /// Blocks the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time with blocking sleeps.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

type Action = Box<dyn FnOnce() + Send>;

struct ManualState {
    now: Duration,
    scheduled: Vec<(Duration, Action)>,
}

/// Virtual time for tests.
///
/// Actions registered with [`ManualClock::schedule_at`] run, in time
/// order, once a `sleep` or `advance` moves the clock to or past their
/// due time. They run outside the clock's lock, so they may use the
/// clock themselves.
#[derive(Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: Duration::ZERO,
                scheduled: Vec::new(),
            })),
        }
    }

    /// Runs `action` when virtual time reaches `at`.
    pub fn schedule_at(&self, at: Duration, action: impl FnOnce() + Send + 'static) {
        if let Ok(mut state) = self.state.lock() {
            state.scheduled.push((at, Box::new(action)));
        }
    }

    /// Moves time forward and fires due actions.
    pub fn advance(&self, duration: Duration) {
        let due = match self.state.lock() {
            Ok(mut state) => {
                state.now += duration;
                let now = state.now;
                let (mut due, pending): (Vec<_>, Vec<_>) = state
                    .scheduled
                    .drain(..)
                    .partition(|(at, _)| *at <= now);
                state.scheduled = pending;
                due.sort_by_key(|(at, _)| *at);
                due
            }
            Err(_) => return,
        };

        for (_, action) in due {
            action();
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state.lock().map(|s| s.now).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
