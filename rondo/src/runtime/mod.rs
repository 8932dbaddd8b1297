use crate::task::Task;

mod event_loop;
pub use event_loop::EventLoop;

mod yield_now;
pub use yield_now::{YieldNow, yield_now};


/// Submit a task to the calling thread's event loop. The task stays usable;
/// call [`Task::wait`] after [`EventLoop::run`] returns to read its result.
pub fn spawn<T: 'static>(task: &Task<T>) {
    EventLoop::current().add_task(task);
}

/// Drive `root` to completion on the calling thread's event loop and return
/// its output.
///
/// The future is wrapped in a root task, submitted, and the loop runs until
/// every queue is empty, which includes everything the root spawned or
/// awaited along the way. This is what `#[rondo::main]` and `#[rondo::test]`
/// expand to.
pub fn block_on<F>(root: F) -> F::Output
where
    F: Future + 'static,
{
    let task = Task::new(async move { Ok::<_, anyhow::Error>(root.await) });
    let event_loop = EventLoop::current();
    event_loop.add_task(&task);
    event_loop.run();

    task.wait()
        .expect("root task bodies are infallible by construction")
}
