/// Read-only view of the host's frame counter.
///
/// The value must never decrease. It is expected to grow by one per frame,
/// driven by something outside the scheduler (see [`crate::tick::FrameLoop`]).
pub trait FrameSource {
    fn frame_counter(&self) -> u64;
}

/// Control directive returned by tick handlers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickControl {
    /// Keep receiving tick notifications.
    Continue,
    /// Unsubscribe after this notification.
    Stop,
}

/// Opaque registration token returned by [`TickService::add_ticker`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TickHandle(pub(crate) u64);

/// Per-frame handler. Receives the frame's delta time in seconds.
pub type TickHandler = Box<dyn FnMut(f32) -> TickControl>;

/// Subscription service invoking registered handlers once per frame.
///
/// Implementations must tolerate `add_ticker` / `remove_ticker` calls made
/// from inside a handler while a dispatch is in progress.
pub trait TickService {
    fn add_ticker(&self, handler: TickHandler) -> TickHandle;

    /// Returns `false` if `handle` was not registered (or already removed).
    fn remove_ticker(&self, handle: TickHandle) -> bool;
}
