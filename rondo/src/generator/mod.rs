use crate::frame::Frame;
use anyhow::{Error, Result};
use std::cell::Cell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

mod combinators;

/// A lazy, pull-driven sequence backed by a suspendable body.
///
/// The body receives a [`Yielder`] and hands values out one at a time with
/// `y.give(value).await`; each give suspends the body until the consumer
/// pulls again. Nothing runs until the first pull. A body that returns `Err`
/// surfaces that error from the in-progress [`next`](Generator::next), after
/// which the generator is terminal and every further pull returns `Ok(None)`.
///
/// Generators are move-only; combinators consume `self` and own it from
/// inside the new generator's body, so dropping the tail of a chain unwinds
/// the whole chain.
pub struct Generator<T> {
    frame: Frame,
    channel: Rc<Channel<T>>,

    /// Last value pulled through [`move_next`](Generator::move_next).
    current: Option<T>,

    finished: bool,
}

/// The slot a body yields through: occupied by a value only between a give
/// and the consumer's take, or by the body's captured error after it fails.
struct Channel<T> {
    value: Cell<Option<T>>,
    error: Cell<Option<Error>>,
}

impl<T: 'static> Generator<T> {
    /// Build a generator from a producer. The producer is handed the
    /// [`Yielder`] and returns the body future; the body does not start
    /// until the first pull.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(Yielder<T>) -> Fut,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let channel = Rc::new(Channel {
            value: Cell::new(None),
            error: Cell::new(None),
        });

        let body = producer(Yielder {
            channel: Rc::clone(&channel),
        });

        let shared = Rc::clone(&channel);
        let frame = Frame::new(async move {
            if let Err(error) = body.await {
                shared.error.set(Some(error));
            }
        });

        Generator {
            frame,
            channel,
            current: None,
            finished: false,
        }
    }

    /// A generator yielding each element of `iter` in order.
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T> + 'static,
    {
        Generator::new(move |y| async move {
            for item in iter {
                y.give(item).await;
            }
            Ok(())
        })
    }

    /// A generator yielding the elements of `range` in order.
    pub fn from_range(range: std::ops::Range<T>) -> Self
    where
        std::ops::Range<T>: Iterator<Item = T>,
    {
        Self::from_iter(range)
    }

    /// Pull the next value.
    ///
    /// Resumes the body until it yields (`Ok(Some(value))`), completes
    /// (`Ok(None)`), or fails (`Err`, raised exactly once). Pulling a
    /// terminal generator keeps returning `Ok(None)`.
    pub fn next(&mut self) -> Result<Option<T>> {
        if self.finished {
            return Ok(None);
        }

        while !self.frame.done() {
            self.frame.resume();
            if let Some(value) = self.channel.value.take() {
                return Ok(Some(value));
            }
            // No yield and not done: the body parked on an awaitable (e.g. a
            // timer during a lazy start); keep driving, as `wait` does.
        }

        self.finished = true;
        match self.channel.error.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }

    /// Pull and park the next value for [`current_value`]; true while the
    /// sequence has not terminated.
    pub fn move_next(&mut self) -> Result<bool> {
        self.current = self.next()?;
        Ok(self.current.is_some())
    }

    /// The value parked by the last successful [`move_next`].
    pub fn current_value(&self) -> Option<&T> {
        self.current.as_ref()
    }
}

impl<T: 'static> Iterator for Generator<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        Generator::next(self).transpose()
    }
}

/// The handle a generator body yields values through.
pub struct Yielder<T> {
    channel: Rc<Channel<T>>,
}

impl<T> Yielder<T> {
    /// Hand `value` to the consumer. The returned future must be awaited:
    /// it parks the body until the next pull.
    #[must_use = "a yielded value reaches the consumer only once this future is awaited"]
    pub fn give(&self, value: T) -> YieldPoint {
        self.channel.value.set(Some(value));
        YieldPoint { parked: false }
    }
}

/// Future returned by [`Yielder::give`]: pending exactly once, so the value
/// set by the give is consumed before the body continues.
#[derive(Debug)]
pub struct YieldPoint {
    parked: bool,
}

impl Future for YieldPoint {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.parked {
            Poll::Ready(())
        } else {
            self.parked = true;
            Poll::Pending
        }
    }
}
