use crate::frame::Frame;
use crate::runtime::EventLoop;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread_local;

/// Per-thread runtime state. Everything in here is single-threaded by
/// contract, so plain `RefCell` interior mutability is enough.
struct Context {
    /// The thread's event loop, created on first use. Tests install their
    /// own instance through [`install_loop`].
    event_loop: Option<Rc<EventLoop>>,

    /// The frame currently being polled, if any. Awaitables read this to
    /// learn which frame is suspending on them.
    running: Option<Frame>,

    /// Pending symmetric-transfer request. A polled frame may designate at
    /// most one successor here before returning; the resume trampoline
    /// takes it and continues there instead of growing the call stack.
    transfer: Option<Frame>,
}

thread_local! {
    static CONTEXT: RefCell<Context> = RefCell::new(Context {
        event_loop: None,
        running: None,
        transfer: None,
    });
}

/// The thread's current event loop, created on first use.
pub(crate) fn current_loop() -> Rc<EventLoop> {
    CONTEXT.with(|ctx| {
        Rc::clone(
            ctx.borrow_mut()
                .event_loop
                .get_or_insert_with(|| Rc::new(EventLoop::new())),
        )
    })
}

/// Replace the thread's event loop, returning the previous one. This is the
/// injection point tests use to run against a fresh loop instance.
pub(crate) fn install_loop(event_loop: Rc<EventLoop>) -> Option<Rc<EventLoop>> {
    CONTEXT.with(|ctx| ctx.borrow_mut().event_loop.replace(event_loop))
}

/// The frame currently being polled on this thread, if any.
pub(crate) fn running_frame() -> Option<Frame> {
    CONTEXT.with(|ctx| ctx.borrow().running.clone())
}

/// Swap the currently-running frame, returning the previous occupant.
///
/// Generator pulls nest polls (a downstream frame polls its upstream frame
/// synchronously), so the trampoline saves and restores this around every
/// poll rather than just setting and clearing it.
pub(crate) fn swap_running(frame: Option<Frame>) -> Option<Frame> {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        std::mem::replace(&mut ctx.running, frame)
    })
}

/// Request that control continue in `next` once the current poll returns.
pub(crate) fn request_transfer(next: Frame) {
    CONTEXT.with(|ctx| {
        let prev = ctx.borrow_mut().transfer.replace(next);
        debug_assert!(prev.is_none(), "a transfer request was already pending");
    });
}

/// Take the pending transfer request, if any.
pub(crate) fn take_transfer() -> Option<Frame> {
    CONTEXT.with(|ctx| ctx.borrow_mut().transfer.take())
}
