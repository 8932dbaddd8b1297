use crate::context;
use crate::frame::Frame;
use std::pin::Pin;
use std::task::{Context, Poll};

/// What an awaitable decided to do with the frame that suspended on it.
#[derive(Debug)]
pub enum Suspend {
    /// Treat the awaitable as ready after all; resume the waiter in place.
    Resume,

    /// Hand control directly to another frame, bypassing the event loop.
    /// The trampoline in [`Frame::resume`] picks this up once the waiter's
    /// poll returns, so the hand-off does not grow the host stack.
    Transfer(Frame),

    /// Leave the waiter suspended. Some external source (the delay heap, a
    /// completing task) is responsible for resuming it later.
    Park,
}

/// The three-method protocol that plugs external events into a frame's
/// suspension points.
///
/// An awaitable is asked [`ready`](Awaitable::ready) first; if true the
/// awaiting expression completes immediately with
/// [`on_resume`](Awaitable::on_resume). Otherwise
/// [`on_suspend`](Awaitable::on_suspend) receives the suspending frame and
/// decides how control flows next. When the frame is eventually resumed, the
/// awaitable is polled again: `ready` must then report true, and `on_resume`
/// produces the value of the awaiting expression.
pub trait Awaitable {
    type Output;

    fn ready(&mut self) -> bool;

    fn on_suspend(&mut self, waiter: Frame) -> Suspend;

    fn on_resume(&mut self) -> Self::Output;
}

/// Adapter turning any [`Awaitable`] into a `Future`, so it can sit directly
/// under an `.await` inside a task or generator body.
#[derive(Debug)]
pub struct Await<A> {
    inner: A,
}

impl<A> Await<A> {
    pub fn new(inner: A) -> Self {
        Await { inner }
    }
}

impl<A: Awaitable + Unpin> Future for Await<A> {
    type Output = A::Output;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let awaitable = &mut self.get_mut().inner;

        if awaitable.ready() {
            return Poll::Ready(awaitable.on_resume());
        }

        let waiter = context::running_frame()
            .expect("awaitable polled outside a rondo frame; drive it with a Task or Generator");

        match awaitable.on_suspend(waiter) {
            Suspend::Resume => Poll::Ready(awaitable.on_resume()),
            Suspend::Transfer(next) => {
                context::request_transfer(next);
                Poll::Pending
            }
            Suspend::Park => Poll::Pending,
        }
    }
}
