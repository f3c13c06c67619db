use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Per-stage wall-clock timings of one request, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StageTimings {
    pub bind_ms: f64,
    pub open_ms: f64,
    pub seek_ms: f64,
    pub capture_ms: f64,
    pub teardown_ms: f64,
    pub encode_ms: f64,
}

impl StageTimings {
    pub fn total_ms(&self) -> f64 {
        self.bind_ms
            + self.open_ms
            + self.seek_ms
            + self.capture_ms
            + self.teardown_ms
            + self.encode_ms
    }
}

/// Stage of the thumbnail pipeline, for timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Bind,
    Open,
    Seek,
    Capture,
    Teardown,
    Encode,
}

/// Stopwatch that attributes elapsed time to pipeline stages.
pub struct StageClock {
    timings: StageTimings,
    last: Instant,
}

impl StageClock {
    pub fn start() -> Self {
        Self {
            timings: StageTimings::default(),
            last: Instant::now(),
        }
    }

    /// Charge the time since the previous mark to `stage`.
    pub fn mark(&mut self, stage: Stage) {
        let now = Instant::now();
        let ms = duration_ms(now - self.last);
        let slot = match stage {
            Stage::Bind => &mut self.timings.bind_ms,
            Stage::Open => &mut self.timings.open_ms,
            Stage::Seek => &mut self.timings.seek_ms,
            Stage::Capture => &mut self.timings.capture_ms,
            Stage::Teardown => &mut self.timings.teardown_ms,
            Stage::Encode => &mut self.timings.encode_ms,
        };
        *slot += ms;
        self.last = now;
    }

    pub fn finish(self) -> StageTimings {
        self.timings
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
