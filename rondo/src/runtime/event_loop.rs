use crate::context;
use crate::frame::Frame;
use crate::task::Task;
use crate::time;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;
use std::thread;
use std::time::Instant;
use tracing::trace;

/// Single-threaded cooperative scheduler: a FIFO queue of frames ready to
/// run and a min-heap of frames parked until a deadline.
///
/// Each thread lazily owns one loop, reachable through
/// [`EventLoop::current`]; tests can swap in their own instance with
/// [`EventLoop::make_current`]. A frame sits in at most one of the two
/// structures at a time, and a frame that completed elsewhere is skipped
/// rather than resumed again.
pub struct EventLoop {
    ready: RefCell<VecDeque<Frame>>,
    delays: RefCell<BinaryHeap<Delay>>,

    /// Tie-break for simultaneous deadlines: insertion order, stable per run.
    delay_seq: Cell<u64>,

    running: Cell<bool>,
}

struct Delay {
    awake_time: Instant,
    seq: u64,
    frame: Frame,
}

// BinaryHeap is a max-heap; reverse the ordering to pop the earliest
// deadline first.
impl Ord for Delay {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.awake_time, other.seq).cmp(&(self.awake_time, self.seq))
    }
}

impl PartialOrd for Delay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Delay {
    fn eq(&self, other: &Self) -> bool {
        self.awake_time == other.awake_time && self.seq == other.seq
    }
}

impl Eq for Delay {}

impl EventLoop {
    pub fn new() -> Self {
        EventLoop {
            ready: RefCell::new(VecDeque::new()),
            delays: RefCell::new(BinaryHeap::new()),
            delay_seq: Cell::new(0),
            running: Cell::new(false),
        }
    }

    /// The calling thread's loop, created on first use.
    pub fn current() -> Rc<EventLoop> {
        context::current_loop()
    }

    /// Install this instance as the thread's current loop, returning the
    /// previous one. Intended for tests that need a loop with no history.
    pub fn make_current(self: &Rc<Self>) -> Option<Rc<EventLoop>> {
        context::install_loop(Rc::clone(self))
    }

    /// Enqueue a task's frame as ready work. The loop shares ownership of
    /// the frame, so the `Task` value stays usable for `wait` afterwards.
    pub fn add_task<T: 'static>(&self, task: &Task<T>) {
        trace!("task submitted to ready queue");
        self.schedule(task.frame().clone());
    }

    /// Park `frame` until `awake_time`.
    pub fn add_delayed(&self, frame: Frame, awake_time: Instant) {
        let seq = self.delay_seq.get();
        self.delay_seq.set(seq + 1);
        self.delays.borrow_mut().push(Delay {
            awake_time,
            seq,
            frame,
        });
    }

    pub(crate) fn schedule(&self, frame: Frame) {
        self.ready.borrow_mut().push_back(frame);
    }

    /// Drain both queues: resume ready frames FIFO, and once only delays
    /// remain, block the thread until the earliest deadline. Returns when
    /// the loop holds no more work. Frames resumed here may enqueue further
    /// frames; those are discovered on the next pass.
    ///
    /// # Panics
    ///
    /// Panics if called while this loop is already running on the thread.
    pub fn run(&self) {
        assert!(
            !self.running.replace(true),
            "EventLoop::run called reentrantly"
        );
        let _reset = RunGuard(&self.running);

        loop {
            let next = self.ready.borrow_mut().pop_front();
            if let Some(frame) = next {
                trace!("resuming ready frame");
                frame.resume();
                continue;
            }

            let deadline = match self.delays.borrow().peek() {
                Some(delay) => delay.awake_time,
                None => break,
            };
            let now = time::now();
            if deadline > now {
                trace!(?deadline, "parking thread until next deadline");
                thread::sleep(deadline - now);
            }

            let expired = self
                .delays
                .borrow_mut()
                .pop()
                .expect("delay heap emptied behind peek");
            expired.frame.resume();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        self.ready.borrow().is_empty() && self.delays.borrow().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn delay_count(&self) -> usize {
        self.delays.borrow().len()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        EventLoop::new()
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("ready", &self.ready.borrow().len())
            .field("delays", &self.delays.borrow().len())
            .field("running", &self.running.get())
            .finish()
    }
}

/// Clears the running flag even if a resumed frame panics, so the loop is
/// usable after the panic is caught.
struct RunGuard<'a>(&'a Cell<bool>);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
