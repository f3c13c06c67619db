use std::sync::Mutex;
use std::time::Duration;

use framegrab_core::timing::Sleeper;

/// Virtual clock: records requested sleeps and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every sleep requested so far.
    pub fn total(&self) -> Duration {
        self.sleeps.lock().unwrap().iter().sum()
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
