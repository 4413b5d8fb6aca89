//! The task registry and its dispatch loop.

mod record;

use core::{
    cell::Cell,
    fmt::{
        Debug,
        Formatter,
    },
};

use crate::{
    alloc::Arena,
    list::List,
    platform::{
        self,
        Clock,
    },
    task::{
        Runnable,
        TaskError,
        TaskHandle,
        TaskInfo,
        TaskStatus,
    },
};

use self::record::TaskRecord;

/// Arena size of [`DefaultScheduler`].
pub const DEFAULT_CAPACITY: usize = 8;

pub type DefaultScheduler<'a, C> = Scheduler<'a, C, DEFAULT_CAPACITY>;

/// Cooperative scheduler for up to `N` tasks.
///
/// Task records are carved from an arena of `N` slots in creation order and
/// linked into the scheduling list; a slot is never reused, even after its
/// task is deleted. Every operation takes `&self`, so a running task body
/// may delete itself or force other tasks through the same scheduler.
///
/// The scheduler is not `Sync`. Interrupt handlers must not touch it; they
/// advance the [`Clock`] and leave the rest to the main loop.
pub struct Scheduler<'a, C, const N: usize> {
    clock: C,
    arena: Arena<TaskRecord<'a>, N>,
    tasks: List,
    current: Cell<Option<usize>>,
    busy: Cell<bool>,
}

impl<'a, C, const N: usize> Scheduler<'a, C, N>
    where C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            arena: Arena::new(|_| TaskRecord::vacant()),
            tasks: List::new(),
            current: Cell::new(None),
            busy: Cell::new(false),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Registers a periodic task and links it behind every existing task.
    ///
    /// `pre_init` runs exactly once, synchronously, after the task has been
    /// linked and before its status becomes [`TaskStatus::Ready`]; it must
    /// not drive the scheduler. A `period_ms` of 0 runs the body on every
    /// pass. The task's last-run time starts at 0.
    ///
    /// Fails with [`TaskError::CapacityExhausted`] once all `N` slots have
    /// been carved, leaving the registry untouched.
    pub fn create(
        &self,
        name: &'a str,
        body: &'a dyn Runnable,
        pre_init: Option<&'a dyn Runnable>,
        period_ms: u32,
    ) -> Result<TaskHandle, TaskError> {
        self.check_thread_mode()?;

        let (index, record) = match self.arena.alloc() {
            Some(slot) => slot,
            None => {
                log::warn!("task list full, cannot create {}", name);
                return Err(TaskError::CapacityExhausted);
            }
        };

        record.populate(name, body, pre_init, period_ms);
        self.tasks.insert_tail(&self.arena, index);
        log::debug!("created task {} (period {} ms)", name, period_ms);

        if let Some(pre_init) = record.pre_init.get() {
            let _busy = Restore::replace(&self.busy, true);
            pre_init.run();
        }

        // pre_init may already have deleted or suspended the task
        if record.status.get() == TaskStatus::Idle {
            record.status.set(TaskStatus::Ready);
        }

        Ok(TaskHandle(index))
    }

    /// Unlinks a task for good and drops its name and callbacks.
    ///
    /// The record's timing history is kept and its slot is not returned to
    /// the arena. A task may delete itself from its own body.
    pub fn delete(&self, task: TaskHandle) -> Result<(), TaskError> {
        self.check_thread_mode()?;

        let record = match self.arena.get(task.0) {
            Some(record) => record,
            None => {
                log::warn!("delete: no task in slot {}", task.0);
                return Err(TaskError::NotFound);
            }
        };

        record.status.set(TaskStatus::Stopped);
        match self.tasks.remove_node(&self.arena, task.0) {
            Some(_) => {
                log::debug!("deleted task {}", record.name());
                record.clear();
                Ok(())
            }
            None => {
                log::warn!("delete: task in slot {} is not linked", task.0);
                Err(TaskError::AlreadyUnlinked)
            }
        }
    }

    /// First registered task named exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<TaskHandle> {
        self.tasks
            .iter(&self.arena)
            .find(|&index| {
                self.arena
                    .get(index)
                    .and_then(|record| record.name.get())
                    .map_or(false, |n| n == name)
            })
            .map(TaskHandle)
    }

    /// Makes the named task run on the next pass whatever its period.
    ///
    /// The task's status is reset to [`TaskStatus::Ready`], which also
    /// resumes a suspended task. Deleted tasks are not registered any more
    /// and cannot be found.
    pub fn execute_by_name(&self, name: &str) -> Result<TaskHandle, TaskError> {
        self.check_thread_mode()?;

        let task = match self.find_by_name(name) {
            Some(task) => task,
            None => {
                log::warn!("execute: no task named {}", name);
                return Err(TaskError::NotFound);
            }
        };

        let record = self.arena.get(task.0).ok_or(TaskError::NotFound)?;
        if record.body.get().is_none() {
            return Err(TaskError::NotFound);
        }

        record.force_run.set(true);
        record.status.set(TaskStatus::Ready);
        log::debug!("forced run of task {}", name);
        Ok(task)
    }

    /// Overrides a task's status, typically to suspend or resume it.
    ///
    /// Setting [`TaskStatus::Stopped`] is the same as [`Scheduler::delete`].
    pub fn set_status(&self, task: TaskHandle, status: TaskStatus) -> Result<(), TaskError> {
        self.check_thread_mode()?;

        if status == TaskStatus::Stopped {
            return self.delete(task);
        }

        let record = self.arena.get(task.0).ok_or(TaskError::NotFound)?;
        if !record.is_linked() {
            return Err(TaskError::AlreadyUnlinked);
        }

        log::debug!("task {}: {} -> {}", record.name(), record.status.get(), status);
        record.status.set(status);
        Ok(())
    }

    /// One scheduler pass.
    ///
    /// The clock is sampled once. Every linked task is then visited in
    /// creation order, and each one that is `Ready` or `Running` and due runs
    /// to completion before the next one is looked at. Its last-run time
    /// becomes the time sampled at the start of the pass.
    ///
    /// A pass started from inside a task body or `pre_init` is ignored.
    pub fn schedule(&self) {
        if self.check_thread_mode().is_err() {
            return;
        }

        if self.busy.get() {
            log::warn!("nested scheduler pass ignored");
            return;
        }
        let _busy = Restore::replace(&self.busy, true);

        let now = self.clock.now_ms();
        let mut cursor = self.tasks.head();

        while let Some(index) = cursor {
            let record = match self.arena.get(index) {
                Some(record) => record,
                None => break,
            };

            // captured before the body runs; the body may unlink this task
            let next = record.node.next();

            if record.status.get().is_schedulable() && record.is_due(now) {
                self.dispatch(index, record, now);
            }

            cursor = self.resume_after(index, next);
        }
    }

    /// Drives the scheduler from the application's main loop.
    pub fn run_forever(&self) -> ! {
        log::info!("scheduler started with {} task(s)", self.len());
        loop {
            self.schedule();
        }
    }

    /// The task whose body is executing right now, if any.
    pub fn current(&self) -> Option<TaskHandle> {
        self.current.get().map(TaskHandle)
    }

    /// Diagnostic view of every registered task, in scheduling order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskInfo<'a>> + '_ {
        self.tasks
            .iter(&self.arena)
            .filter_map(move |index| self.arena.get(index).map(|record| record.info(index)))
    }

    /// Copy of [`Scheduler::tasks`] that outlives the borrow of the scheduler.
    pub fn snapshot(&self) -> heapless::Vec<TaskInfo<'a>, N> {
        let mut snapshot = heapless::Vec::new();
        for info in self.tasks() {
            if snapshot.push(info).is_err() {
                break;
            }
        }
        snapshot
    }

    pub fn info(&self, task: TaskHandle) -> Option<TaskInfo<'a>> {
        self.arena
            .get(task.0)
            .filter(|record| record.is_linked())
            .map(|record| record.info(task.0))
    }

    /// Logs one line per registered task.
    pub fn show(&self) {
        for info in self.tasks() {
            log::info!("{}", info);
        }
    }

    /// Number of registered (not deleted) tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Slots left in the arena. Deleting tasks does not give any back.
    pub fn remaining(&self) -> usize {
        self.arena.remaining()
    }

    fn dispatch(&self, index: usize, record: &TaskRecord<'a>, now: u32) {
        record.force_run.set(false);

        let body = match record.body.get() {
            Some(body) => body,
            None => return,
        };

        log::trace!("running task {}", record.name());
        record.status.set(TaskStatus::Running);
        {
            let _current = Restore::replace(&self.current, Some(index));
            body.run();
        }

        record.last_run_ms.set(now);
        // the body may have deleted, suspended or re-forced itself
        if record.status.get() == TaskStatus::Running {
            record.status.set(TaskStatus::Ready);
        }
    }

    /// Where the walk continues once `current` has been visited.
    ///
    /// Normally the link captured before the body ran. If the body unlinked
    /// that successor, its link is gone; the walk then picks the first
    /// linked task created after `current`. Tasks are only ever appended and
    /// slots are carved in order, so list order is slot order.
    fn resume_after(&self, current: usize, captured: Option<usize>) -> Option<usize> {
        match captured {
            Some(next) if !self.arena.get(next).map_or(false, |r| r.is_linked()) => {
                self.tasks.iter(&self.arena).find(|&index| index > current)
            }
            _ => captured,
        }
    }

    fn check_thread_mode(&self) -> Result<(), TaskError> {
        if platform::in_thread_mode() {
            Ok(())
        } else {
            log::error!("scheduler used from interrupt context");
            Err(TaskError::InterruptContext)
        }
    }
}

/// Puts the previous value back into a `Cell` when dropped, so a body that
/// panics under `std` does not leave the scheduler marked busy.
struct Restore<'c, T: Copy> {
    cell: &'c Cell<T>,
    previous: T,
}

impl<'c, T: Copy> Restore<'c, T> {
    fn replace(cell: &'c Cell<T>, value: T) -> Self {
        Self {
            previous: cell.replace(value),
            cell,
        }
    }
}

impl<T: Copy> Drop for Restore<'_, T> {
    fn drop(&mut self) {
        self.cell.set(self.previous);
    }
}

impl<C, const N: usize> Debug for Scheduler<'_, C, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Scheduler@{:?} ({} task(s), {}/{} slots used)",
            self as *const Self,
            self.tasks.len(),
            self.arena.len(),
            N,
        )
    }
}
