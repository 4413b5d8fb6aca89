use core::cell::Cell;

use crate::{
    alloc::Arena,
    list::{
        ListNode,
        Nodes,
    },
    task::{
        Runnable,
        TaskHandle,
        TaskInfo,
        TaskStatus,
    },
};

/// Task control block, embedded in a slot of the scheduler's arena.
pub(crate) struct TaskRecord<'a> {
    pub(crate) name: Cell<Option<&'a str>>,
    pub(crate) body: Cell<Option<&'a dyn Runnable>>,
    pub(crate) pre_init: Cell<Option<&'a dyn Runnable>>,
    pub(crate) period_ms: Cell<u32>,
    pub(crate) last_run_ms: Cell<u32>,
    pub(crate) force_run: Cell<bool>,
    pub(crate) status: Cell<TaskStatus>,
    pub(crate) node: ListNode,
}

impl<'a> TaskRecord<'a> {
    pub(crate) fn vacant() -> Self {
        Self {
            name: Cell::new(None),
            body: Cell::new(None),
            pre_init: Cell::new(None),
            period_ms: Cell::new(0),
            last_run_ms: Cell::new(0),
            force_run: Cell::new(false),
            status: Cell::new(TaskStatus::Idle),
            node: ListNode::new(),
        }
    }

    pub(crate) fn populate(
        &self,
        name: &'a str,
        body: &'a dyn Runnable,
        pre_init: Option<&'a dyn Runnable>,
        period_ms: u32,
    ) {
        self.name.set(Some(name));
        self.body.set(Some(body));
        self.pre_init.set(pre_init);
        self.period_ms.set(period_ms);
        self.last_run_ms.set(0);
        self.force_run.set(false);
        self.status.set(TaskStatus::Idle);
        self.node.reset();
    }

    /// Drops the borrowed name and callbacks. Timing history stays.
    pub(crate) fn clear(&self) {
        self.name.set(None);
        self.body.set(None);
        self.pre_init.set(None);
    }

    pub(crate) fn name(&self) -> &'a str {
        self.name.get().unwrap_or("")
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.status.get() != TaskStatus::Stopped
    }

    /// Period elapsed since the last run, or a forced run is pending.
    ///
    /// The counter is 32 bits; `wrapping_sub` yields the elapsed time across
    /// one wrap of the clock.
    pub(crate) fn is_due(&self, now: u32) -> bool {
        self.force_run.get() || now.wrapping_sub(self.last_run_ms.get()) >= self.period_ms.get()
    }

    pub(crate) fn info(&self, index: usize) -> TaskInfo<'a> {
        TaskInfo {
            handle: TaskHandle(index),
            name: self.name(),
            status: self.status.get(),
            force_run: self.force_run.get(),
            last_run_ms: self.last_run_ms.get(),
            period_ms: self.period_ms.get(),
        }
    }
}

impl<'a, const N: usize> Nodes for Arena<TaskRecord<'a>, N> {
    fn node(&self, index: usize) -> Option<&ListNode> {
        self.get(index).map(|record| &record.node)
    }
}
