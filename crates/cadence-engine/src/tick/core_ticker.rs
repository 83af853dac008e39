use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{TickControl, TickHandle, TickHandler, TickService};

struct Entry {
    handle: TickHandle,
    /// `None` while the handler is being invoked.
    handler: Option<TickHandler>,
    removed: bool,
}

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
    next_handle: u64,
    dispatching: bool,
}

/// Reference [`TickService`]: a registry of per-frame handlers.
///
/// Handlers run in registration order. The registry is never borrowed while a
/// handler runs, so handlers may freely add or remove tickers (including
/// themselves):
/// - handlers added during a dispatch first run on the next dispatch
/// - handlers removed during a dispatch are not invoked again, even later in
///   the same dispatch
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct CoreTicker {
    inner: Rc<RefCell<Registry>>,
}

impl CoreTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.iter().filter(|e| !e.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every registered handler once.
    ///
    /// A nested call from inside a handler is ignored. If a handler panics the
    /// panic propagates, but the handler keeps its registration and the next
    /// `tick` dispatches normally. Handlers after the panicking one miss this
    /// dispatch.
    pub fn tick(&self, dt: f32) {
        let count = {
            let mut reg = self.inner.borrow_mut();
            if reg.dispatching {
                log::warn!("nested CoreTicker::tick ignored");
                return;
            }
            reg.dispatching = true;
            reg.entries.len()
        };
        let mut dispatch = Dispatch {
            ticker: self,
            running: None,
        };

        // Indices stay valid: nothing is removed from `entries` until the
        // dispatch ends, and additions only append.
        for i in 0..count {
            let taken = {
                let mut reg = self.inner.borrow_mut();
                let entry = &mut reg.entries[i];
                if entry.removed {
                    None
                } else {
                    entry.handler.take()
                }
            };
            let Some(handler) = taken else { continue };

            let handler = &mut dispatch.running.insert((i, handler)).1;
            let control = handler(dt);
            let Some((_, handler)) = dispatch.running.take() else { continue };

            let mut reg = self.inner.borrow_mut();
            let entry = &mut reg.entries[i];
            if control == TickControl::Stop {
                entry.removed = true;
            }
            if entry.removed {
                // Dropped outside the borrow: a handler may own state whose
                // destructor calls back into this registry.
                drop(reg);
                drop(handler);
            } else {
                entry.handler = Some(handler);
            }
        }

        drop(dispatch);
    }
}

/// Ends a dispatch, including one cut short by a panicking handler.
struct Dispatch<'a> {
    ticker: &'a CoreTicker,
    /// Handler currently being invoked, with its entry index.
    running: Option<(usize, TickHandler)>,
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        let interrupted = self.running.take();

        let (dead, orphan) = {
            let mut reg = self.ticker.inner.borrow_mut();
            reg.dispatching = false;

            // Only set when the handler unwound: put it back in its slot.
            let orphan = match interrupted {
                Some((i, handler)) if !reg.entries[i].removed => {
                    reg.entries[i].handler = Some(handler);
                    None
                }
                Some((_, handler)) => Some(handler),
                None => None,
            };

            let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut reg.entries)
                .into_iter()
                .partition(|e| !e.removed);
            reg.entries = live;
            (dead, orphan)
        };
        drop(orphan);
        drop(dead);
    }
}

impl TickService for CoreTicker {
    fn add_ticker(&self, handler: TickHandler) -> TickHandle {
        let mut reg = self.inner.borrow_mut();
        let handle = TickHandle(reg.next_handle);
        reg.next_handle += 1;
        reg.entries.push(Entry {
            handle,
            handler: Some(handler),
            removed: false,
        });
        handle
    }

    fn remove_ticker(&self, handle: TickHandle) -> bool {
        let mut reg = self.inner.borrow_mut();
        let Some(pos) = reg
            .entries
            .iter()
            .position(|e| e.handle == handle && !e.removed)
        else {
            return false;
        };

        if reg.dispatching {
            let entry = &mut reg.entries[pos];
            entry.removed = true;
            let handler = entry.handler.take();
            drop(reg);
            drop(handler);
        } else {
            let entry = reg.entries.remove(pos);
            drop(reg);
            drop(entry);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> TickHandler {
        let log = log.clone();
        Box::new(move |_| {
            log.borrow_mut().push(name);
            TickControl::Continue
        })
    }

    #[test]
    fn dispatches_in_registration_order() {
        let ticker = CoreTicker::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        ticker.add_ticker(recorder(&log, "a"));
        ticker.add_ticker(recorder(&log, "b"));
        ticker.add_ticker(recorder(&log, "c"));

        ticker.tick(0.016);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn stop_unsubscribes() {
        let ticker = CoreTicker::new();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        ticker.add_ticker(Box::new(move |_| {
            c.set(c.get() + 1);
            TickControl::Stop
        }));

        ticker.tick(0.016);
        ticker.tick(0.016);
        assert_eq!(calls.get(), 1);
        assert!(ticker.is_empty());
    }

    #[test]
    fn remove_unknown_handle_returns_false() {
        let ticker = CoreTicker::new();
        let h = ticker.add_ticker(Box::new(|_| TickControl::Continue));
        assert!(ticker.remove_ticker(h));
        assert!(!ticker.remove_ticker(h));
        assert_eq!(ticker.len(), 0);
    }

    #[test]
    fn added_during_dispatch_runs_next_frame() {
        let ticker = CoreTicker::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let t = ticker.clone();
        let l = log.clone();
        let mut armed = true;
        ticker.add_ticker(Box::new(move |_| {
            if armed {
                armed = false;
                t.add_ticker(recorder(&l, "late"));
            }
            TickControl::Continue
        }));

        ticker.tick(0.016);
        assert!(log.borrow().is_empty());
        assert_eq!(ticker.len(), 2);

        ticker.tick(0.016);
        assert_eq!(*log.borrow(), ["late"]);
    }

    #[test]
    fn removed_during_dispatch_is_skipped() {
        let ticker = CoreTicker::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let victim = Rc::new(Cell::new(None));
        let t = ticker.clone();
        let v = victim.clone();
        ticker.add_ticker(Box::new(move |_| {
            if let Some(h) = v.take() {
                assert!(t.remove_ticker(h));
            }
            TickControl::Continue
        }));
        victim.set(Some(ticker.add_ticker(recorder(&log, "victim"))));

        ticker.tick(0.016);
        assert!(log.borrow().is_empty());
        assert_eq!(ticker.len(), 1);
    }

    #[test]
    fn panicking_handler_keeps_its_registration() {
        let ticker = CoreTicker::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let armed = Rc::new(Cell::new(true));
        let a = armed.clone();
        let l = log.clone();
        ticker.add_ticker(Box::new(move |_| {
            if a.replace(false) {
                panic!("handler failure");
            }
            l.borrow_mut().push("flaky");
            TickControl::Continue
        }));
        ticker.add_ticker(recorder(&log, "steady"));

        let result = panic::catch_unwind(AssertUnwindSafe(|| ticker.tick(0.016)));
        assert!(result.is_err());
        // The handler after the panicking one missed that dispatch.
        assert!(log.borrow().is_empty());
        assert_eq!(ticker.len(), 2);

        ticker.tick(0.016);
        assert_eq!(*log.borrow(), ["flaky", "steady"]);
    }

    #[test]
    fn nested_tick_is_ignored() {
        let ticker = CoreTicker::new();
        let calls = Rc::new(Cell::new(0));
        let t = ticker.clone();
        let c = calls.clone();
        ticker.add_ticker(Box::new(move |dt| {
            c.set(c.get() + 1);
            t.tick(dt);
            TickControl::Continue
        }));

        ticker.tick(0.016);
        assert_eq!(calls.get(), 1);
    }
}
