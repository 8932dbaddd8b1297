//! # Rondo
//!
//! **Rondo** is a single-threaded cooperative runtime pairing lazy,
//! pull-driven [`Generator`]s with one-shot chainable [`Task`]s, scheduled by
//! an [`EventLoop`] that owns a FIFO ready queue and a time-ordered delay
//! heap.
//!
//! Everything runs on the calling thread. Tasks start lazily, suspend only
//! at `.await` points, and hand control to each other by symmetric transfer:
//! awaiting a task jumps straight into it, and a completing task jumps
//! straight back to its waiter, without re-entering the scheduler or growing
//! the call stack. Generators suspend at each yielded value and are pulled
//! one element at a time through functional combinators (`map`, `filter`,
//! `take`, `take_while`, `scan`) and terminal consumers (`for_each`, `fold`,
//! `reduce`).
//!
//! Bodies are fallible: returning `Err` is how a body throws. The error is
//! captured where it happened and re-raised wherever the result is consumed,
//! whether that is [`Task::wait`], an `.await` in another task, or a
//! generator pull.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rondo::{sleep_for, spawn, Task};
//! use std::time::Duration;
//!
//! #[rondo::main]
//! async fn main() {
//!     let greeter = Task::new(async {
//!         sleep_for(Duration::from_millis(100)).await;
//!         println!("hello from the delay heap");
//!         Ok(())
//!     });
//!
//!     spawn(&greeter);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`generator`]: lazy sequences and combinators
//! - [`task`]: one-shot async computations and chaining
//! - [`runtime`]: the event loop, `spawn`, `block_on`, `yield_now`
//! - [`time`]: `now` and the sleep awaitables
//! - [`awaitable`]: the protocol for plugging new suspension sources in

#[doc(inline)]
pub use rondo_macros::main;

#[doc(inline)]
pub use rondo_macros::test;

pub(crate) mod context;

pub mod awaitable;
pub use awaitable::{Await, Awaitable, Suspend};

pub mod frame;
pub use frame::Frame;

pub mod generator;
pub use generator::{Generator, Yielder};

pub mod runtime;
pub use runtime::{EventLoop, block_on, spawn, yield_now};

pub mod task;
pub use task::{Task, just};

pub mod time;
pub use time::{Sleep, now, sleep, sleep_for, sleep_until};

#[cfg(test)]
pub(crate) mod test_utils;
