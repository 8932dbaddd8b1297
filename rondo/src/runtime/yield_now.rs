use crate::awaitable::{Await, Awaitable, Suspend};
use crate::frame::Frame;
use crate::runtime::EventLoop;

/// Park the running frame at the back of the ready queue, letting every
/// frame already queued run first.
///
/// Useful inside long computations that would otherwise starve their peers
/// on the shared thread:
///
/// ```rust,ignore
/// for chunk in work.chunks(100) {
///     process(chunk);
///     rondo::yield_now().await;
/// }
/// ```
pub fn yield_now() -> Await<YieldNow> {
    Await::new(YieldNow { yielded: false })
}

/// Awaitable behind [`yield_now`]: suspends exactly once.
#[derive(Debug)]
pub struct YieldNow {
    yielded: bool,
}

impl Awaitable for YieldNow {
    type Output = ();

    fn ready(&mut self) -> bool {
        self.yielded
    }

    fn on_suspend(&mut self, waiter: Frame) -> Suspend {
        self.yielded = true;
        EventLoop::current().schedule(waiter);
        Suspend::Park
    }

    fn on_resume(&mut self) {}
}
