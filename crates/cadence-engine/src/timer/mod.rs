//! Frame-delayed callbacks.
//!
//! [`FrameTimer`] owns an ordered queue of [`FramePayload`]s and evaluates it once
//! per frame through a tick subscription. [`DeferredCallback`] is the payload
//! behind [`FrameTimer::schedule`]; custom payload types can join the same queue.

mod frame_timer;
mod payload;

pub use frame_timer::{FrameTimer, TimerHandle};
pub use payload::{DeferredCallback, FramePayload};
