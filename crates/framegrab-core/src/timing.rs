use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Something that can pause the calling thread.
///
/// Production code sleeps for real; tests swap in a virtual clock so bounded
/// waits finish instantly while still recording how long they would have taken.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A bounded retry loop: at most `attempts` sleeps of `interval_ms` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl PollPolicy {
    pub const fn new(attempts: u32, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on time spent sleeping.
    pub fn total(&self) -> Duration {
        self.interval() * self.attempts
    }

    /// Run `check` until it returns true or the attempts run out.
    ///
    /// `check` runs before every sleep and once more after the last one, so a
    /// condition that flips during the final interval is still observed.
    pub fn poll_until<F>(&self, sleeper: &dyn Sleeper, mut check: F) -> bool
    where
        F: FnMut() -> bool,
    {
        for _ in 0..self.attempts {
            if check() {
                return true;
            }
            sleeper.sleep(self.interval());
        }
        check()
    }

    /// Sleep out the whole bound. Used where the engine offers no completion
    /// signal to wait on.
    pub fn wait_out(&self, sleeper: &dyn Sleeper) {
        for _ in 0..self.attempts {
            sleeper.sleep(self.interval());
        }
    }
}
