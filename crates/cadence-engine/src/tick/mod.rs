//! Reference tick facility.
//!
//! `CoreTicker` implements [`crate::core::TickService`]; `FrameLoop` drives it
//! together with a [`crate::time::FrameClock`] for hosts that have no engine
//! loop of their own (tools, simulations, tests).

mod core_ticker;
mod frame_loop;

pub use core_ticker::CoreTicker;
pub use frame_loop::FrameLoop;
