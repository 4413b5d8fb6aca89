#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! A cooperative, run-to-completion task scheduler for single-core
//! microcontrollers.
//!
//! Tasks are carved from a fixed arena owned by the [`Scheduler`], linked
//! into an intrusive list in creation order, and dispatched from the
//! application's main loop whenever their period has elapsed on the
//! millisecond [`Clock`](platform::Clock).
//!
//! ```
//! use coop_sched::{platform::TickCounter, Scheduler};
//!
//! let blink = || { /* toggle a led */ };
//! let scheduler: Scheduler<'_, TickCounter, 4> = Scheduler::new(TickCounter::new());
//! scheduler.create("blink", &blink, None, 500).unwrap();
//!
//! scheduler.clock().advance(500);
//! scheduler.schedule();
//! ```

pub extern crate heapless;

pub mod list;
pub mod platform;
pub mod scheduler;
pub mod task;

mod alloc;

pub use crate::{
    scheduler::{
        DefaultScheduler,
        Scheduler,
        DEFAULT_CAPACITY,
    },
    task::{
        Runnable,
        TaskError,
        TaskHandle,
        TaskInfo,
        TaskStatus,
    },
};
