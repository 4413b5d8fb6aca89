//! Task-facing types: statuses, handles, the runnable capability, errors,
//! and the diagnostic snapshot.

use core::fmt::{
    self,
    Display,
    Formatter,
};

/// Errors returned by the task registry.
///
/// None of them is fatal; the scheduler keeps running whatever the caller
/// does with them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// Every slot of the task arena has been handed out
    CapacityExhausted,

    /// No registered task matches the name or handle
    NotFound,

    /// The task has already been deleted
    AlreadyUnlinked,

    /// Registry operations were invoked from an interrupt handler
    InterruptContext,
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::CapacityExhausted => f.write_str("task arena exhausted"),
            TaskError::NotFound => f.write_str("no such task"),
            TaskError::AlreadyUnlinked => f.write_str("task already deleted"),
            TaskError::InterruptContext => f.write_str("called from interrupt context"),
        }
    }
}

/// Lifecycle of a task record.
///
/// `Idle` while `pre_init` runs, `Ready`/`Running` while scheduled,
/// `Stopped` once deleted. `Suspended` is only ever set by a collaborator
/// through [`Scheduler::set_status`](crate::Scheduler::set_status).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    Ready,
    Running,
    Suspended,
    Stopped,
}

impl TaskStatus {
    /// Whether a scheduler pass considers the task at all.
    pub fn is_schedulable(self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Running)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Suspended => "suspended",
            TaskStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Identifies a task record inside its scheduler's arena.
///
/// Handles stay valid for the whole life of the scheduler; after the task is
/// deleted every operation on the handle reports
/// [`TaskError::AlreadyUnlinked`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub(crate) usize);

impl TaskHandle {
    /// Arena slot of the task, which is also its creation rank.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Zero-argument unit of work: a task body or a `pre_init` hook.
///
/// Implemented for every `Fn()`, so closures and plain `fn` items can be
/// registered directly. State a body needs to mutate lives in `Cell`s or
/// statics, as it would in an interrupt-free firmware loop.
pub trait Runnable {
    fn run(&self);
}

impl<F> Runnable for F
    where F: Fn(),
{
    fn run(&self) {
        self()
    }
}

/// Read-only view of one registered task.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TaskInfo<'a> {
    pub handle: TaskHandle,
    pub name: &'a str,
    pub status: TaskStatus,
    pub force_run: bool,
    pub last_run_ms: u32,
    pub period_ms: u32,
}

impl Display for TaskInfo<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {}: status {}, force run {}, last run {} ms, period {} ms",
            self.name,
            self.status,
            self.force_run,
            self.last_run_ms,
            self.period_ms,
        )
    }
}
