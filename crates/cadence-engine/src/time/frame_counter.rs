use std::cell::Cell;
use std::rc::Rc;

use crate::core::FrameSource;

/// Shared monotonic frame counter.
///
/// Clones observe the same value, so the driver can advance it while any number
/// of schedulers read it through [`FrameSource`].
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    value: Rc<Cell<u64>>,
}

impl FrameCounter {
    /// Creates a counter starting at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(frame: u64) -> Self {
        Self {
            value: Rc::new(Cell::new(frame)),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.get()
    }

    /// Moves to the next frame and returns the new value.
    ///
    /// Saturates at `u64::MAX` rather than wrapping; the counter must never go
    /// backwards.
    pub fn advance(&self) -> u64 {
        let next = self.value.get().saturating_add(1);
        self.value.set(next);
        next
    }
}

impl FrameSource for FrameCounter {
    fn frame_counter(&self) -> u64 {
        self.get()
    }
}
