use crate::awaitable::{Await, Awaitable, Suspend};
use crate::frame::Frame;
use crate::runtime::EventLoop;
use crate::time::now;
use std::time::{Duration, Instant};

/// Awaitable that completes once `awake_time` has passed.
///
/// Awaiting a sleep whose deadline already passed completes immediately.
/// Otherwise the suspending frame is registered with the current loop's
/// delay heap and resumed no earlier than the deadline, on the loop's next
/// pass over it.
#[derive(Debug)]
pub struct Sleep {
    awake_time: Instant,

    /// The delay-heap entry is made once; re-polls while pending (a `wait`
    /// drive spinning on the frame) must not duplicate it.
    registered: bool,
}

impl Awaitable for Sleep {
    type Output = ();

    fn ready(&mut self) -> bool {
        self.awake_time <= now()
    }

    fn on_suspend(&mut self, waiter: Frame) -> Suspend {
        if !self.registered {
            self.registered = true;
            EventLoop::current().add_delayed(waiter, self.awake_time);
        }
        Suspend::Park
    }

    fn on_resume(&mut self) {}
}

impl IntoFuture for Sleep {
    type Output = ();
    type IntoFuture = Await<Sleep>;

    fn into_future(self) -> Self::IntoFuture {
        Await::new(self)
    }
}

/// Sleep until `deadline`.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        awake_time: deadline,
        registered: false,
    }
}

/// Sleep for `duration` from now.
pub fn sleep_for(duration: Duration) -> Sleep {
    sleep_until(now() + duration)
}

/// Alias of [`sleep_for`], matching the usual runtime spelling.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_for(duration)
}
