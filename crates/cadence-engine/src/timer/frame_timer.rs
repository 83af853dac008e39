use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::{FrameSource, TickControl, TickHandle, TickService};

use super::payload::{DeferredCallback, FramePayload};

type Payloads = Vec<Box<dyn FramePayload>>;

struct TimerState {
    frames: Rc<dyn FrameSource>,
    ticks: Rc<dyn TickService>,

    /// Registration order is execution order.
    pending: RefCell<Payloads>,
    /// Entries detached for the running pass that have not fired yet.
    in_flight: Cell<usize>,
    evaluating: Cell<bool>,
    last_evaluated_frame: Cell<Option<u64>>,
    subscription: Cell<Option<TickHandle>>,
    /// Set when the owning `FrameTimer` is dropped.
    closed: Cell<bool>,
}

impl TimerState {
    fn schedule<F>(self: &Rc<Self>, delay: u64, callback: F)
    where
        F: FnOnce() + 'static,
    {
        if delay == 0 {
            callback();
            return;
        }

        let now = self.frames.frame_counter();
        self.push(Box::new(DeferredCallback::new(delay, now, callback)));
    }

    fn push(self: &Rc<Self>, payload: Box<dyn FramePayload>) {
        if payload.is_done() {
            log::trace!("frame payload already done; not queued");
            return;
        }
        self.pending.borrow_mut().push(payload);
        self.start_ticking();
    }

    fn start_ticking(self: &Rc<Self>) {
        if self.closed.get() || self.subscription.get().is_some() {
            return;
        }

        let weak: Weak<TimerState> = Rc::downgrade(self);
        let handle = self.ticks.add_ticker(Box::new(move |dt| match weak.upgrade() {
            Some(state) => state.tick(dt),
            None => TickControl::Stop,
        }));
        self.subscription.set(Some(handle));
        log::debug!("frame timer subscribed to tick ({handle:?})");
    }

    fn pending_count(&self) -> usize {
        self.pending.borrow().len() + self.in_flight.get()
    }

    fn tick(&self, _dt: f32) -> TickControl {
        let now = self.frames.frame_counter();

        if self.evaluating.get()
            || self.pending.borrow().is_empty()
            || self.last_evaluated_frame.get() == Some(now)
        {
            return TickControl::Continue;
        }

        self.last_evaluated_frame.set(Some(now));

        // Detach the queue so callbacks can schedule onto `pending` while we
        // scan. Late arrivals are appended behind the survivors when the pass
        // ends, which keeps registration order intact.
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        let mut pass = Pass::begin(self, batch);

        // Forward, so callbacks due on the same frame run in the order they
        // were scheduled.
        let mut i = 0;
        while i < pass.batch.len() && !self.closed.get() {
            let payload = &mut pass.batch[i];
            // The entry under evaluation is not counted while its callback runs.
            let counted = !payload.is_done();
            if counted {
                self.in_flight.set(self.in_flight.get() - 1);
            }
            if payload.tick_frame(now) {
                pass.finished.push(i);
            } else if counted {
                self.in_flight.set(self.in_flight.get() + 1);
            }
            i += 1;
        }

        log::trace!(
            "frame {now}: evaluated {} payloads, {} fired",
            pass.batch.len(),
            pass.finished.len()
        );

        drop(pass);
        TickControl::Continue
    }

    /// Discards all pending work and unsubscribes.
    fn close(&self) {
        self.closed.set(true);

        let discarded = std::mem::take(&mut *self.pending.borrow_mut());
        let abandoned = discarded.len() + self.in_flight.get();
        if abandoned > 0 {
            log::debug!("frame timer dropped with {abandoned} pending callbacks; discarding");
        }
        drop(discarded);

        if let Some(handle) = self.subscription.take() {
            self.ticks.remove_ticker(handle);
            log::debug!("frame timer unsubscribed from tick ({handle:?})");
        }
    }
}

/// One evaluation pass over the detached queue.
///
/// Compaction and re-attachment happen on drop so that a panicking callback
/// does not leave the timer stuck mid-pass. Entries after the panicking one
/// were not evaluated this frame: they lose one countdown step and fire one
/// frame late.
struct Pass<'a> {
    state: &'a TimerState,
    batch: Payloads,
    /// Indices of entries that reported done, ascending.
    finished: Vec<usize>,
}

impl<'a> Pass<'a> {
    fn begin(state: &'a TimerState, batch: Payloads) -> Self {
        state.evaluating.set(true);
        state.in_flight.set(batch.iter().filter(|p| !p.is_done()).count());
        Self {
            state,
            batch,
            finished: Vec::new(),
        }
    }
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        let state = self.state;
        state.evaluating.set(false);
        state.in_flight.set(0);

        if state.closed.get() {
            // Owner went away mid-pass; `self.batch` is discarded unfired.
            return;
        }

        if std::thread::panicking() {
            // The entry that panicked is done but was never recorded.
            self.batch.retain(|p| !p.is_done());
        } else {
            // Highest index first so lower indices stay valid.
            for &index in self.finished.iter().rev() {
                self.batch.remove(index);
            }
        }

        let mut pending = state.pending.borrow_mut();
        let late = std::mem::replace(&mut *pending, std::mem::take(&mut self.batch));
        pending.extend(late);
    }
}

/// Executes callbacks after a delay measured in frames.
///
/// Delays are counted against the injected [`FrameSource`]; evaluation is
/// driven by a subscription to the injected [`TickService`], taken lazily on
/// the first delayed `schedule` (or explicitly with [`start_ticking`]).
///
/// Guarantees:
/// - a callback scheduled on frame `F` with delay `d > 0` fires on frame
///   `F + d`, exactly once, never on frame `F` itself
/// - callbacks due on the same frame fire in scheduling order
/// - at most one evaluation pass runs per frame counter value, however many
///   times the tick fires for it
/// - callbacks may schedule more work (through a [`TimerHandle`]); that work
///   is never evaluated in the pass that scheduled it
///
/// Dropping the timer discards every pending callback without running it and
/// unsubscribes from the tick service.
///
/// [`start_ticking`]: Self::start_ticking
pub struct FrameTimer {
    state: Rc<TimerState>,
}

impl FrameTimer {
    pub fn new(frames: Rc<dyn FrameSource>, ticks: Rc<dyn TickService>) -> Self {
        Self {
            state: Rc::new(TimerState {
                frames,
                ticks,
                pending: RefCell::new(Vec::new()),
                in_flight: Cell::new(0),
                evaluating: Cell::new(false),
                last_evaluated_frame: Cell::new(None),
                subscription: Cell::new(None),
                closed: Cell::new(false),
            }),
        }
    }

    /// Subscribes to the tick service. Idempotent.
    pub fn start_ticking(&self) {
        self.state.start_ticking();
    }

    pub fn is_ticking(&self) -> bool {
        self.state.subscription.get().is_some()
    }

    /// Runs `callback` after `delay` frames.
    ///
    /// A delay of 0 runs `callback` immediately, before this call returns.
    /// There is no cancellation.
    pub fn schedule<F>(&self, delay: u64, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.state.schedule(delay, callback);
    }

    /// Like [`schedule`](Self::schedule), but holds `target` weakly.
    ///
    /// `callback` receives the target only if it is still alive when the delay
    /// elapses; otherwise it is dropped without running.
    pub fn schedule_weak<T, F>(&self, delay: u64, target: &Rc<T>, callback: F)
    where
        T: 'static,
        F: FnOnce(Rc<T>) + 'static,
    {
        self.state.schedule(delay, weak_callback(target, callback));
    }

    /// Appends a custom payload to the same ordered queue as plain callbacks.
    pub fn schedule_payload(&self, payload: Box<dyn FramePayload>) {
        self.state.push(payload);
    }

    /// Per-frame handler.
    ///
    /// Normally invoked through the tick subscription. Hosts that drive the
    /// timer by hand may call it directly; repeated calls within one frame are
    /// no-ops. `dt` is ignored.
    pub fn tick(&self, dt: f32) -> TickControl {
        self.state.tick(dt)
    }

    /// Number of callbacks that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.state.pending_count()
    }

    pub fn all_done(&self) -> bool {
        self.pending_count() == 0
    }

    /// Frame counter value of the most recent evaluation pass.
    pub fn last_evaluated_frame(&self) -> Option<u64> {
        self.state.last_evaluated_frame.get()
    }

    /// Weak handle for scheduling from inside callbacks.
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            state: Rc::downgrade(&self.state),
        }
    }
}

impl Drop for FrameTimer {
    fn drop(&mut self) {
        self.state.close();
    }
}

/// Non-owning handle to a [`FrameTimer`].
///
/// Callbacks capture this instead of the timer itself; it does not keep the
/// timer alive and does nothing once the timer has been dropped.
#[derive(Clone)]
pub struct TimerHandle {
    state: Weak<TimerState>,
}

impl TimerHandle {
    fn live(&self) -> Option<Rc<TimerState>> {
        self.state.upgrade().filter(|s| !s.closed.get())
    }

    pub fn is_alive(&self) -> bool {
        self.live().is_some()
    }

    /// See [`FrameTimer::schedule`]. Returns `false` (and drops `callback`)
    /// if the timer is gone.
    pub fn schedule<F>(&self, delay: u64, callback: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        match self.live() {
            Some(state) => {
                state.schedule(delay, callback);
                true
            }
            None => false,
        }
    }

    /// See [`FrameTimer::schedule_weak`].
    pub fn schedule_weak<T, F>(&self, delay: u64, target: &Rc<T>, callback: F) -> bool
    where
        T: 'static,
        F: FnOnce(Rc<T>) + 'static,
    {
        self.schedule(delay, weak_callback(target, callback))
    }

    pub fn pending_count(&self) -> usize {
        self.live().map_or(0, |s| s.pending_count())
    }
}

fn weak_callback<T, F>(target: &Rc<T>, callback: F) -> impl FnOnce() + use<T, F>
where
    T: 'static,
    F: FnOnce(Rc<T>) + 'static,
{
    let target = Rc::downgrade(target);
    move || match target.upgrade() {
        Some(target) => callback(target),
        None => log::trace!("weak frame callback skipped: target dropped"),
    }
}
