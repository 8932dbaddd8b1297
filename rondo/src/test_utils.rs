use crate::runtime::EventLoop;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Install a brand-new event loop as the thread's current one and return
/// it, so a test never inherits frames parked by an earlier test on the
/// same thread.
pub(crate) fn fresh_loop() -> Rc<EventLoop> {
    let event_loop = Rc::new(EventLoop::new());
    event_loop.make_current();
    event_loop
}

/// Shared append-only journal for asserting the order of side effects
/// across task bodies.
#[derive(Clone, Default)]
pub(crate) struct Journal {
    entries: Rc<RefCell<Vec<&'static str>>>,
}

impl Journal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, entry: &'static str) {
        self.entries.borrow_mut().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<&'static str> {
        self.entries.borrow().clone()
    }
}

/// Margin added to timing upper bounds so loaded CI machines don't flake.
pub(crate) const SCHED_SLACK: Duration = Duration::from_millis(50);
