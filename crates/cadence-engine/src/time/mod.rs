//! Time subsystem.
//!
//! Frame counting is purely logical: delays are measured in frames, never in
//! seconds. Intended usage:
//! - one `FrameClock` per loop, sharing its `FrameCounter` with schedulers
//! - call `tick()` once per frame to advance the counter and obtain `FrameTime`

mod frame_clock;
mod frame_counter;

pub use frame_clock::{FrameClock, FrameTime};
pub use frame_counter::FrameCounter;
