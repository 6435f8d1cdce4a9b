//! Frame-granular, single-threaded cooperative scheduler. Each animation
//! frame runs writes, per-frame component updates, and reads to exhaustion
//! synchronously before yielding back to the host, rather than pausing
//! mid-frame.

mod frame;
mod tick;

pub use frame::{Frame, WriteTask};
pub use tick::{ManualTickDriver, TickDriver};

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::arena::{ElementId, ResourcePool, ScopeId};
use crate::component::ComponentHandle;
use crate::config::SchedulerConfig;

type BoxedTask = Box<dyn FnOnce()>;

/// Owns the monotonic clock, the current/next frame pair, and the
/// micro/macrotask queues for one independent scheduler instance.
///
/// The constructor is public rather than hidden behind a lazily-initialized
/// static so tests can construct an isolated instance.
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    clock: Cell<u64>,
    current_frame: RefCell<Frame>,
    next_frame: RefCell<Frame>,
    microtasks: RefCell<VecDeque<BoxedTask>>,
    macrotasks: RefCell<VecDeque<BoxedTask>>,
    update_each_frame: RefCell<Vec<ComponentHandle>>,
    frame_pending: Cell<bool>,
    microtask_pending: Cell<bool>,
    macrotask_pending: Cell<bool>,
    running: Cell<bool>,
    resources: RefCell<ResourcePool>,
    tick: RefCell<Box<dyn TickDriver>>,
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Scheduler {
            inner: self.inner.clone(),
        }
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, tick: Box<dyn TickDriver>) -> Self {
        let bucket_cap = config.depth_bucket_capacity;
        Scheduler {
            inner: Rc::new(SchedulerInner {
                clock: Cell::new(1),
                current_frame: RefCell::new(Frame::new(bucket_cap)),
                next_frame: RefCell::new(Frame::new(bucket_cap)),
                microtasks: RefCell::new(VecDeque::new()),
                macrotasks: RefCell::new(VecDeque::new()),
                update_each_frame: RefCell::new(Vec::new()),
                frame_pending: Cell::new(false),
                microtask_pending: Cell::new(false),
                macrotask_pending: Cell::new(false),
                running: Cell::new(false),
                resources: RefCell::new(ResourcePool::new(&config)),
                tick: RefCell::new(tick),
            }),
        }
    }

    pub fn with_manual_tick(config: SchedulerConfig) -> Self {
        Self::new(config, Box::new(ManualTickDriver::default()))
    }

    pub fn clock(&self) -> u64 {
        self.inner.clock.get()
    }

    pub fn next_scope_id(&self) -> ScopeId {
        self.inner.resources.borrow_mut().next_scope()
    }

    pub fn reclaim_scope_id(&self, id: ScopeId) {
        self.inner.resources.borrow_mut().reclaim_scope(id);
    }

    pub fn next_element_id(&self) -> ElementId {
        self.inner.resources.borrow_mut().next_element()
    }

    pub fn reclaim_element_id(&self, id: ElementId) {
        self.inner.resources.borrow_mut().reclaim_element(id);
    }

    /// Returns the frame under execution. Valid at any time; outside of a
    /// running batch it aliases `next_frame()`.
    pub fn current_frame(&self) -> FrameHandle<'_> {
        FrameHandle {
            scheduler: self,
            which: FrameSlot::Current,
        }
    }

    /// Returns the pending frame, arming an animation-frame tick if one is
    /// not already requested.
    pub fn next_frame(&self) -> FrameHandle<'_> {
        if !self.inner.frame_pending.get() {
            self.inner.frame_pending.set(true);
            let sched = self.clone();
            self.inner
                .tick
                .borrow_mut()
                .request_animation_frame(Box::new(move || sched.run_frame()));
        }
        FrameHandle {
            scheduler: self,
            which: FrameSlot::Next,
        }
    }

    pub fn schedule_microtask(&self, cb: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(cb));
        if !self.inner.microtask_pending.get() {
            self.inner.microtask_pending.set(true);
            let sched = self.clone();
            self.inner
                .tick
                .borrow_mut()
                .schedule_microtask(Box::new(move || sched.drain_microtasks()));
        }
    }

    pub fn schedule_macrotask(&self, cb: impl FnOnce() + 'static) {
        self.inner.macrotasks.borrow_mut().push_back(Box::new(cb));
        if !self.inner.macrotask_pending.get() {
            self.inner.macrotask_pending.set(true);
            let sched = self.clone();
            self.inner
                .tick
                .borrow_mut()
                .schedule_macrotask(Box::new(move || sched.drain_macrotasks()));
        }
    }

    pub fn start_update_each_frame(&self, c: ComponentHandle) {
        let mut list = self.inner.update_each_frame.borrow_mut();
        if !list.iter().any(|existing| existing.ptr_eq(&c)) {
            list.push(c);
        }
    }

    pub fn stop_update_each_frame(&self, c: &ComponentHandle) {
        self.inner
            .update_each_frame
            .borrow_mut()
            .retain(|existing| !existing.ptr_eq(c));
    }

    fn drain_microtasks(&self) {
        self.inner.microtask_pending.set(false);
        loop {
            let task = self.inner.microtasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        self.advance_clock();
    }

    fn drain_macrotasks(&self) {
        self.inner.macrotask_pending.set(false);
        loop {
            let task = self.inner.macrotasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
        self.advance_clock();
    }

    /// Runs writes, per-frame component updates, and reads to exhaustion:
    /// loops until the current frame has no write tasks and no read tasks
    /// left, since either phase can enqueue more work into the other
    /// (a write scheduled from inside a read, or vice versa).
    fn run_frame(&self) {
        self.inner.frame_pending.set(false);
        self.inner.running.set(true);

        self.inner.current_frame.swap(&self.inner.next_frame);

        for c in self.inner.update_each_frame.borrow().iter() {
            c.mark_dirty_for_frame();
        }

        loop {
            while self.inner.current_frame.borrow().has_writes() {
                self.drain_prioritized_writes();
                self.drain_plain_writes();
            }

            self.inner.update_each_frame.borrow_mut().retain(|c| c.wants_update_each_frame());
            for c in self.inner.update_each_frame.borrow().clone() {
                c.run_scheduled_update(self);
            }

            if !self.inner.current_frame.borrow().has_writes() && !self.inner.current_frame.borrow().has_reads() {
                break;
            }
            self.drain_reads();
        }

        self.drain_after_tasks();

        if !self.inner.update_each_frame.borrow().is_empty() && !self.inner.frame_pending.get() {
            self.inner.frame_pending.set(true);
            let sched = self.clone();
            self.inner
                .tick
                .borrow_mut()
                .request_animation_frame(Box::new(move || sched.run_frame()));
        }

        self.advance_clock();
        self.inner.running.set(false);
    }

    fn drain_prioritized_writes(&self) {
        loop {
            let bucket = self.inner.current_frame.borrow_mut().take_next_prioritized_bucket();
            let Some(tasks) = bucket else { break };
            if tasks.is_empty() {
                continue;
            }
            for task in tasks {
                task.run(self);
            }
        }
    }

    fn drain_plain_writes(&self) {
        loop {
            let tasks = self.inner.current_frame.borrow_mut().take_plain_writes();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                task.run(self);
            }
        }
    }

    fn drain_reads(&self) {
        let reads = self.inner.current_frame.borrow_mut().take_reads();
        for read in reads {
            read();
        }
    }

    fn drain_after_tasks(&self) {
        let afters = self.inner.current_frame.borrow_mut().take_after_tasks();
        for after in afters {
            after();
        }
    }

    fn advance_clock(&self) {
        self.inner.clock.set(self.inner.clock.get() + 1);
    }

    /// Drives pending ticks synchronously; only meaningful with a
    /// `ManualTickDriver`. Exists so tests can deterministically step
    /// frames/microtasks/macrotasks without a real event loop.
    pub fn run_pending_frame(&self) -> bool {
        self.inner.tick.borrow_mut().run_one_animation_frame()
    }

    pub fn run_pending_microtasks(&self) -> bool {
        self.inner.tick.borrow_mut().run_one_microtask()
    }

    pub fn run_pending_macrotasks(&self) -> bool {
        self.inner.tick.borrow_mut().run_one_macrotask()
    }
}

#[derive(Clone, Copy)]
enum FrameSlot {
    Current,
    Next,
}

/// A reference to one of the scheduler's two frames, returned by
/// `current_frame()`/`next_frame()`.
pub struct FrameHandle<'a> {
    scheduler: &'a Scheduler,
    which: FrameSlot,
}

impl<'a> FrameHandle<'a> {
    fn frame(&self) -> &RefCell<Frame> {
        match self.which {
            FrameSlot::Current => &self.scheduler.inner.current_frame,
            FrameSlot::Next => &self.scheduler.inner.next_frame,
        }
    }

    pub fn write(&self, task: WriteTask, priority: Option<usize>) {
        self.frame().borrow_mut().push_write(task, priority);
    }

    pub fn update_component(&self, c: ComponentHandle) {
        let depth = c.depth();
        self.write(WriteTask::Component(c), Some(depth));
    }

    pub fn read(&self, cb: impl FnOnce() + 'static) {
        self.frame().borrow_mut().push_read(Box::new(cb));
    }

    pub fn after(&self, cb: impl FnOnce() + 'static) {
        self.frame().borrow_mut().push_after(Box::new(cb));
    }
}
