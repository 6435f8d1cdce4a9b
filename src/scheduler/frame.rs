//! One animation-frame execution window: four queues (depth-indexed
//! prioritized writes, plain writes, reads, after-tasks).

use std::collections::VecDeque;

use crate::component::ComponentHandle;
use crate::scheduler::Scheduler;

/// A task enqueued onto a write queue. A component entry is resolved to a
/// call to its `update()`; a plain function is called directly.
pub enum WriteTask {
    Component(ComponentHandle),
    Fn(Box<dyn FnOnce(&Scheduler)>),
}

impl WriteTask {
    pub(super) fn run(self, scheduler: &Scheduler) {
        match self {
            WriteTask::Component(c) => c.run_scheduled_update(scheduler),
            WriteTask::Fn(f) => f(scheduler),
        }
    }
}

pub struct Frame {
    /// Bucket `i` holds writes enqueued at depth `i`. Smaller index runs
    /// first, guaranteeing a parent's write executes before any child's.
    prioritized: Vec<Vec<WriteTask>>,
    plain: VecDeque<WriteTask>,
    reads: VecDeque<Box<dyn FnOnce()>>,
    after: VecDeque<Box<dyn FnOnce()>>,
}

impl Frame {
    pub fn new(bucket_capacity: usize) -> Self {
        Frame {
            prioritized: Vec::with_capacity(bucket_capacity),
            plain: VecDeque::new(),
            reads: VecDeque::new(),
            after: VecDeque::new(),
        }
    }

    pub fn has_writes(&self) -> bool {
        self.prioritized.iter().any(|b| !b.is_empty()) || !self.plain.is_empty()
    }

    pub fn has_reads(&self) -> bool {
        !self.reads.is_empty()
    }

    pub fn push_write(&mut self, task: WriteTask, priority: Option<usize>) {
        match priority {
            Some(depth) => {
                if self.prioritized.len() <= depth {
                    self.prioritized.resize_with(depth + 1, Vec::new);
                }
                self.prioritized[depth].push(task);
            }
            None => self.plain.push_back(task),
        }
    }

    pub fn push_read(&mut self, cb: Box<dyn FnOnce()>) {
        self.reads.push_back(cb);
    }

    pub fn push_after(&mut self, cb: Box<dyn FnOnce()>) {
        self.after.push_back(cb);
    }

    /// Drains and returns the lowest-index non-empty prioritized bucket, or
    /// `None` if every bucket is currently empty.
    pub fn take_next_prioritized_bucket(&mut self) -> Option<Vec<WriteTask>> {
        for bucket in self.prioritized.iter_mut() {
            if !bucket.is_empty() {
                return Some(std::mem::take(bucket));
            }
        }
        None
    }

    pub fn take_plain_writes(&mut self) -> Vec<WriteTask> {
        self.plain.drain(..).collect()
    }

    pub fn take_reads(&mut self) -> Vec<Box<dyn FnOnce()>> {
        self.reads.drain(..).collect()
    }

    pub fn take_after_tasks(&mut self) -> Vec<Box<dyn FnOnce()>> {
        self.after.drain(..).collect()
    }
}
