use std::fmt;

/// Unit of frame-delayed work stored by [`super::FrameTimer`].
///
/// Anything implementing this trait can share the timer's ordered queue with
/// plain callbacks (see [`super::FrameTimer::schedule_payload`]).
pub trait FramePayload {
    /// Evaluates the payload for frame `now`.
    ///
    /// Called at most once per frame. Returns `true` once the payload has fired;
    /// from then on it must keep returning `true` without side effects.
    fn tick_frame(&mut self, now: u64) -> bool;

    fn is_done(&self) -> bool;
}

/// Runs a closure after a number of frames has elapsed.
///
/// The closure fires on frame `creation_frame + delay`, and never on the frame
/// the payload was created in, even with a delay of 1. That guards against work
/// queued by something that ticked earlier in the same frame.
pub struct DeferredCallback<F>
where
    F: FnOnce(),
{
    creation_frame: u64,
    remaining_frames: u64,
    callback: Option<F>,
    done: bool,
}

impl<F> DeferredCallback<F>
where
    F: FnOnce(),
{
    /// `delay` is clamped to at least 1. `now` is the frame counter at creation.
    pub fn new(delay: u64, now: u64, callback: F) -> Self {
        Self {
            creation_frame: now,
            remaining_frames: delay.max(1),
            callback: Some(callback),
            done: false,
        }
    }

    pub fn creation_frame(&self) -> u64 {
        self.creation_frame
    }

    pub fn remaining_frames(&self) -> u64 {
        self.remaining_frames
    }
}

impl<F> FramePayload for DeferredCallback<F>
where
    F: FnOnce(),
{
    fn tick_frame(&mut self, now: u64) -> bool {
        if !self.done && now > self.creation_frame {
            self.remaining_frames -= 1;
            if self.remaining_frames == 0 {
                self.done = true;
                if let Some(callback) = self.callback.take() {
                    callback();
                }
            }
        }

        self.done
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.done
    }
}

impl<F> fmt::Debug for DeferredCallback<F>
where
    F: FnOnce(),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCallback")
            .field("creation_frame", &self.creation_frame)
            .field("remaining_frames", &self.remaining_frames)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(calls: Rc<Cell<u32>>) -> impl FnOnce() {
        move || calls.set(calls.get() + 1)
    }

    #[test]
    fn zero_delay_is_clamped_to_one() {
        let calls = Rc::new(Cell::new(0));
        let p = DeferredCallback::new(0, 5, counting(calls.clone()));
        assert_eq!(p.remaining_frames(), 1);
    }

    #[test]
    fn never_fires_in_creation_frame() {
        let calls = Rc::new(Cell::new(0));
        let mut p = DeferredCallback::new(1, 5, counting(calls.clone()));

        assert!(!p.tick_frame(5));
        assert!(!p.tick_frame(5));
        assert_eq!(p.remaining_frames(), 1);
        assert_eq!(calls.get(), 0);

        assert!(p.tick_frame(6));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn counts_down_one_per_evaluation() {
        let calls = Rc::new(Cell::new(0));
        let mut p = DeferredCallback::new(3, 10, counting(calls.clone()));

        assert!(!p.tick_frame(11));
        assert_eq!(p.remaining_frames(), 2);
        assert!(!p.tick_frame(12));
        assert_eq!(p.remaining_frames(), 1);
        assert!(p.tick_frame(13));
        assert_eq!(p.remaining_frames(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn done_payload_is_inert() {
        let calls = Rc::new(Cell::new(0));
        let mut p = DeferredCallback::new(1, 0, counting(calls.clone()));

        assert!(p.tick_frame(1));
        assert!(p.tick_frame(2));
        assert!(p.tick_frame(3));
        assert!(p.is_done());
        assert_eq!(p.remaining_frames(), 0);
        assert_eq!(calls.get(), 1);
    }
}
