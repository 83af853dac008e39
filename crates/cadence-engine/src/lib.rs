//! Cadence engine crate.
//!
//! Deferred callbacks measured in frames rather than seconds, for code driven
//! by a per-frame update loop.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`core`] | `FrameSource`, `TickService`, `TickControl` host contracts |
//! | [`time`] | `FrameClock`, `FrameCounter` |
//! | [`tick`] | `CoreTicker`, `FrameLoop` reference host |
//! | [`timer`] | `FrameTimer`, `DeferredCallback`, `FramePayload` |
//! | [`logging`] | `init_logging` |
//!
//! # Quick start
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use cadence_engine::tick::FrameLoop;
//!
//! let mut frames = FrameLoop::new();
//! let timer = frames.create_timer();
//!
//! let fired_on = Rc::new(Cell::new(0));
//! let counter = frames.counter().clone();
//! let f = fired_on.clone();
//! timer.schedule(3, move || f.set(counter.get()));
//!
//! frames.run_frames(5);
//! assert_eq!(fired_on.get(), 3);
//! assert!(timer.all_done());
//! ```

pub mod core;
pub mod logging;
pub mod tick;
pub mod time;
pub mod timer;
