use crate::context;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::{Context, Poll};

/// Handle to the materialized state of a suspendable procedure: the boxed
/// future holding its locals and resume point, plus a completion flag.
///
/// `Frame` is a cheap clone (`Rc`); the queues of the event loop, the promise
/// waiter slots, and the owning `Task`/`Generator` all share the same
/// underlying state. The frame's storage is released when the last handle is
/// dropped, unwinding the body's locals if it never ran to completion.
#[derive(Clone)]
pub struct Frame {
    raw: Rc<RawFrame>,
}

struct RawFrame {
    /// The suspended body. Borrowed mutably only for the duration of a poll;
    /// a second borrow means someone resumed a frame that is already on the
    /// thread's poll stack, which is a protocol violation.
    body: RefCell<LocalBoxFuture<'static, ()>>,

    done: Cell<bool>,
}

impl Frame {
    /// Wrap a body future into an initially-suspended frame. Nothing runs
    /// until the first [`resume`](Frame::resume).
    pub(crate) fn new(body: impl Future<Output = ()> + 'static) -> Self {
        Frame {
            raw: Rc::new(RawFrame {
                body: RefCell::new(body.boxed_local()),
                done: Cell::new(false),
            }),
        }
    }

    /// True once the body has run to completion. A done frame is never
    /// polled again; its promise state stays readable through whichever
    /// handles still point at it.
    pub fn done(&self) -> bool {
        self.raw.done.get()
    }

    /// Run this frame until it suspends or completes, then follow any
    /// symmetric-transfer requests it (or its successors) leave behind.
    ///
    /// The loop here is the trampoline that keeps `await` chains flat: when
    /// a frame suspends into another frame, or completes and hands control
    /// to its waiter, the successor is recorded in the thread context and
    /// picked up by this loop instead of being resumed recursively. Chains
    /// of any depth therefore run in constant host stack.
    ///
    /// Resuming a frame that is already `done` is a no-op.
    pub fn resume(&self) {
        let mut current = self.clone();
        loop {
            if !current.done() {
                current.poll_once();
            }
            match context::take_transfer() {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    fn poll_once(&self) {
        let mut body = self
            .raw
            .body
            .try_borrow_mut()
            .expect("frame resumed while it is already running");

        let previous = context::swap_running(Some(self.clone()));
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let poll = body.as_mut().poll(&mut cx);
        context::swap_running(previous);

        if let Poll::Ready(()) = poll {
            self.raw.done.set(true);
        }
    }

    /// True when both handles refer to the same underlying frame.
    pub(crate) fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.raw, &other.raw)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("done", &self.done())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_lazy_until_first_resume() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);

        let frame = Frame::new(async move { flag.set(true) });
        assert!(!ran.get());
        assert!(!frame.done());

        frame.resume();
        assert!(ran.get());
        assert!(frame.done());
    }

    #[test]
    fn resume_after_done_is_a_no_op() {
        let runs = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&runs);

        let frame = Frame::new(async move { counter.set(counter.get() + 1) });
        frame.resume();
        frame.resume();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn dropping_a_suspended_frame_unwinds_its_locals() {
        struct Canary(Rc<Cell<bool>>);
        impl Drop for Canary {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let canary = Canary(Rc::clone(&dropped));

        let frame = Frame::new(async move {
            let _held = canary;
            std::future::pending::<()>().await;
        });
        frame.resume();
        assert!(!frame.done());
        assert!(!dropped.get());

        drop(frame);
        assert!(dropped.get());
    }
}
