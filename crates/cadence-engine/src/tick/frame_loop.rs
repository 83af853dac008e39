use std::rc::Rc;

use crate::core::{FrameSource, TickService};
use crate::time::{FrameClock, FrameCounter, FrameTime};
use crate::timer::FrameTimer;

use super::CoreTicker;

/// Headless frame driver.
///
/// Owns the clock (and through it the frame counter) plus the ticker registry.
/// Each [`step`](Self::step) is one frame: the counter advances first, then every
/// registered ticker is dispatched once.
pub struct FrameLoop {
    clock: FrameClock,
    ticker: CoreTicker,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::with_clock(FrameClock::new())
    }

    pub fn with_clock(clock: FrameClock) -> Self {
        Self {
            clock,
            ticker: CoreTicker::new(),
        }
    }

    pub fn counter(&self) -> &FrameCounter {
        self.clock.counter()
    }

    pub fn ticker(&self) -> &CoreTicker {
        &self.ticker
    }

    pub fn frame_source(&self) -> Rc<dyn FrameSource> {
        Rc::new(self.clock.counter().clone())
    }

    pub fn tick_service(&self) -> Rc<dyn TickService> {
        Rc::new(self.ticker.clone())
    }

    /// Creates a timer bound to this loop's counter and ticker.
    pub fn create_timer(&self) -> FrameTimer {
        FrameTimer::new(self.frame_source(), self.tick_service())
    }

    /// Runs one frame.
    pub fn step(&mut self) -> FrameTime {
        let ft = self.clock.tick();
        log::trace!("frame {} (dt {:.4}s)", ft.frame_index, ft.dt);
        self.ticker.tick(ft.dt);
        ft
    }

    pub fn run_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.step();
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}
