use std::time::{Duration, Instant};

use super::FrameCounter;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Frame counter value after this tick.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Each `tick()` advances the attached [`FrameCounter`] by exactly one, so the
/// counter read by schedulers always matches the frame being dispatched.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls. The clamped `dt` is informational only;
/// frame-delayed work never looks at it.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    counter: FrameCounter,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps and a fresh counter at frame 0.
    pub fn new() -> Self {
        Self::with_clamps(
            Duration::from_micros(100), // 0.0001s
            Duration::from_millis(250), // 0.25s
        )
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            counter: FrameCounter::new(),
            dt_min,
            dt_max,
        }
    }

    /// Replaces the frame counter this clock advances.
    pub fn with_counter(mut self, counter: FrameCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn counter(&self) -> &FrameCounter {
        &self.counter
    }

    /// Resets the delta-time baseline. The frame counter is left untouched.
    ///
    /// Useful when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the counter by one frame and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.counter.advance(),
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
