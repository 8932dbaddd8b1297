use crate::awaitable::{Await, Awaitable, Suspend};
use crate::context;
use crate::frame::Frame;
use anyhow::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// A lazy, one-shot asynchronous computation.
///
/// Invoking [`Task::new`] runs nothing: the body starts on the first resume,
/// whether that comes from [`wait`](Task::wait), from the event loop after
/// [`EventLoop::add_task`](crate::EventLoop::add_task), or from another task
/// awaiting this one. The body is a fallible future; returning `Err` is the
/// task's way of throwing, and the error is captured in the promise and
/// re-raised wherever the result is consumed.
///
/// Tasks are move-only. Awaiting a task consumes it; its result becomes the
/// value of the awaiting expression.
pub struct Task<T> {
    frame: Frame,
    promise: Rc<RefCell<TaskPromise<T>>>,
}

/// Per-task state shared between the body (which fulfills it) and external
/// observers (which consume it).
struct TaskPromise<T> {
    state: TaskState<T>,

    /// The frame suspended on awaiting this task, if any. Single-writer,
    /// single-reader: at most one awaiter exists because awaiting consumes
    /// the task.
    waiter: Option<Frame>,
}

enum TaskState<T> {
    Pending,
    Value(T),
    Error(Error),
    Taken,
}

impl<T> TaskPromise<T> {
    fn settled(&self) -> bool {
        !matches!(self.state, TaskState::Pending)
    }

    fn fulfill(&mut self, result: Result<T>) -> Option<Frame> {
        debug_assert!(!self.settled(), "task promise fulfilled twice");
        self.state = match result {
            Ok(value) => TaskState::Value(value),
            Err(error) => TaskState::Error(error),
        };
        self.waiter.take()
    }

    fn take(&mut self) -> Result<T> {
        match std::mem::replace(&mut self.state, TaskState::Taken) {
            TaskState::Value(value) => Ok(value),
            TaskState::Error(error) => Err(error),
            TaskState::Pending => panic!("task result read before the body completed"),
            TaskState::Taken => panic!("task result consumed twice"),
        }
    }
}

impl<T: 'static> Task<T> {
    /// Wrap a fallible future into an initially-suspended task.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = Result<T>> + 'static,
    {
        let promise = Rc::new(RefCell::new(TaskPromise {
            state: TaskState::Pending,
            waiter: None,
        }));

        let shared = Rc::clone(&promise);
        let frame = Frame::new(async move {
            let result = body.await;

            // Final suspension: publish the result first, then hand control
            // to the waiter (if one registered) via the trampoline. The
            // waiter's resumption therefore always observes a settled
            // promise.
            let waiter = shared.borrow_mut().fulfill(result);
            if let Some(waiter) = waiter {
                context::request_transfer(waiter);
            }
        });

        Task { frame, promise }
    }

    /// Drive this task to completion on the current thread and return its
    /// result, re-raising any captured error.
    ///
    /// This is a blocking resume-loop for top-level synchronous drivers; it
    /// does not engage the event loop. If the body parks on a timer while no
    /// loop is running, the loop here spins until the deadline passes. Do
    /// not use `wait` and `EventLoop::run` to drive the same task.
    pub fn wait(self) -> Result<T> {
        while !self.frame.done() {
            self.frame.resume();
        }
        self.promise.borrow_mut().take()
    }

    /// A task that awaits `self`, then completes with `f(value)`. Errors
    /// from `self` propagate through unchanged; `f` is not invoked for them.
    pub fn then<U, F>(self, f: F) -> Task<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        Task::new(async move { Ok(f(self.await?)) })
    }

    /// A task that awaits `self` and, if it failed, hands the error to `f`
    /// and completes normally. The success value, if any, is discarded.
    pub fn catching<F>(self, f: F) -> Task<()>
    where
        F: FnOnce(Error) + 'static,
    {
        Task::new(async move {
            if let Err(error) = self.await {
                f(error);
            }
            Ok(())
        })
    }

    /// A task that awaits `self`, runs `f` unconditionally, and then
    /// re-raises any error `self` produced.
    pub fn finally<F>(self, f: F) -> Task<()>
    where
        F: FnOnce() + 'static,
    {
        Task::new(async move {
            let result = self.await;
            f();
            result.map(drop)
        })
    }

    pub(crate) fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// A task that completes with `value` on its first resume.
pub fn just<T: 'static>(value: T) -> Task<T> {
    Task::new(async move { Ok(value) })
}

/// Awaiting a task moves it into the awaiter; the task's result becomes the
/// value of the awaiting expression.
impl<T: 'static> IntoFuture for Task<T> {
    type Output = Result<T>;
    type IntoFuture = Await<TaskAwaiter<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Await::new(TaskAwaiter { task: self })
    }
}

/// Awaitable over an owned [`Task`].
///
/// Suspending registers the waiter with the awaited task's promise and
/// transfers control straight into the awaited frame; the loop is not
/// involved. When the awaited body completes, its final suspension transfers
/// control back here and [`on_resume`](Awaitable::on_resume) reads the
/// settled result.
pub struct TaskAwaiter<T> {
    task: Task<T>,
}

impl<T: 'static> Awaitable for TaskAwaiter<T> {
    type Output = Result<T>;

    fn ready(&mut self) -> bool {
        // A lazy task is never ready on first ask, but a task that already
        // ran to completion (through the loop, or `just` resumed earlier in
        // this chain) must not park the waiter behind a frame that will
        // never run again.
        self.task.promise.borrow().settled()
    }

    fn on_suspend(&mut self, waiter: Frame) -> Suspend {
        // A `wait` busy-spin re-polls this while the awaited body is parked
        // on a timer, so the same waiter can suspend here repeatedly; the
        // registration must be idempotent. The transfer still happens every
        // time: under `wait` it is what keeps driving the sleeping child.
        {
            let mut promise = self.task.promise.borrow_mut();
            let already_registered = promise
                .waiter
                .as_ref()
                .is_some_and(|registered| registered.ptr_eq(&waiter));
            if !already_registered {
                promise.waiter = Some(waiter);
            }
        }
        Suspend::Transfer(self.task.frame.clone())
    }

    fn on_resume(&mut self) -> Result<T> {
        self.task.promise.borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    #[rstest]
    #[case::zero(0)]
    #[case::small(7)]
    #[case::large(i64::MAX)]
    fn just_round_trips_through_wait(#[case] value: i64) {
        assert_eq!(just(value).wait().unwrap(), value);
    }

    #[test]
    fn body_runs_lazily() {
        let started = Rc::new(Cell::new(false));
        let flag = Rc::clone(&started);

        let task = Task::new(async move {
            flag.set(true);
            Ok(1)
        });
        assert!(!started.get());
        assert_eq!(task.wait().unwrap(), 1);
        assert!(started.get());
    }

    #[test]
    fn wait_re_raises_a_captured_error() {
        let task: Task<i32> = Task::new(async { Err(anyhow::anyhow!("boom")) });
        let err = task.wait().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn then_maps_the_success_value() {
        let task = just(21).then(|v| v * 2);
        assert_eq!(task.wait().unwrap(), 42);
    }

    #[test]
    fn then_propagates_errors_without_invoking_the_callback() {
        let invoked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&invoked);

        let failing: Task<i32> = Task::new(async { Err(anyhow::anyhow!("upstream")) });
        let task = failing.then(move |v| {
            flag.set(true);
            v
        });

        assert_eq!(task.wait().unwrap_err().to_string(), "upstream");
        assert!(!invoked.get());
    }

    #[test]
    fn catching_converts_an_error_into_normal_completion() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);

        let failing: Task<i32> = Task::new(async { Err(anyhow::anyhow!("caught")) });
        let task = failing.catching(move |e| *sink.borrow_mut() = e.to_string());

        task.wait().unwrap();
        assert_eq!(*seen.borrow(), "caught");
    }

    #[test]
    fn catching_skips_the_handler_on_success() {
        let invoked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&invoked);

        just(5).catching(move |_| flag.set(true)).wait().unwrap();
        assert!(!invoked.get());
    }

    #[test]
    fn finally_runs_its_action_and_re_raises() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);

        let failing: Task<i32> = Task::new(async { Err(anyhow::anyhow!("still here")) });
        let task = failing.finally(move || flag.set(true));

        assert_eq!(task.wait().unwrap_err().to_string(), "still here");
        assert!(ran.get());
    }

    #[test]
    fn finally_runs_on_success_too() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);

        just(5).finally(move || flag.set(true)).wait().unwrap();
        assert!(ran.get());
    }

    #[test]
    fn error_pipeline_matches_the_chaining_contract() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let (ok_log, catch_log, fin_log) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let failing: Task<i32> = Task::new(async { Err(anyhow::anyhow!("pipeline")) });
        let task = failing
            .then(move |v| {
                ok_log.borrow_mut().push("then");
                v
            })
            .catching(move |e| {
                assert_eq!(e.to_string(), "pipeline");
                catch_log.borrow_mut().push("catching");
            })
            .finally(move || fin_log.borrow_mut().push("finally"));

        task.wait().unwrap();
        assert_eq!(*log.borrow(), ["catching", "finally"]);
    }

    #[test]
    fn sequential_awaits_complete_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let (log_a, log_b, log_c) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let a = Task::new(async move {
            log_a.borrow_mut().push("a");
            Ok(1)
        });
        let b = Task::new(async move {
            log_b.borrow_mut().push("b");
            Ok(2)
        });
        let c = Task::new(async move {
            let first = a.await?;
            let second = b.await?;
            log_c.borrow_mut().push("c");
            Ok(first + second)
        });

        assert_eq!(c.wait().unwrap(), 3);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn deep_then_chains_run_in_constant_stack() {
        let mut task = just(0u64);
        for _ in 0..5_000 {
            task = task.then(|v| v + 1);
        }
        assert_eq!(task.wait().unwrap(), 5_000);
    }

    #[test]
    fn auto_traits_reflect_the_single_threaded_contract() {
        use static_assertions::{assert_impl_all, assert_not_impl_any};

        assert_impl_all!(Task<i32>: Unpin);
        assert_not_impl_any!(Task<i32>: Send, Sync);
    }
}
