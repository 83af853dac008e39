//! Host-facing contracts.
//!
//! The scheduler never reaches for global state. The frame counter and the
//! tick subscription facility are injected through these traits so the same
//! code runs inside an engine loop or against a hand-driven fake in tests.

mod host;

pub use host::{FrameSource, TickControl, TickHandle, TickHandler, TickService};
