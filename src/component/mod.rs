//! Component lifecycle, descriptor vtable, and the depth-ordered update
//! priority that the scheduler relies on.

pub mod invalidator;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::arena::{ElementId, ScopeId};
use crate::debug_invariant;
use crate::error::{Error, Result};
use crate::macros::bitflags_lite;
use crate::scheduler::{Scheduler, WriteTask};
use crate::vnode::VNode;
use invalidator::{cancel_subscription, Invalidator, Subscriber, SubscriptionHandle};

bitflags_lite! {
    pub struct ComponentFlags: u16 {
        const DIRTY              = 1 << 0;
        const ATTACHED            = 1 << 1;
        const MOUNTING            = 1 << 2;
        const SVG                 = 1 << 3;
        const DISPOSED             = 1 << 4;
        const UPDATE_EACH_FRAME    = 1 << 5;
        const IN_UPDATE_QUEUE      = 1 << 6;
    }
}

/// Type-erased props/data payload passed to a component's callbacks.
pub type DataBox = Rc<dyn Any>;

/// The vtable of lifecycle callbacks and configuration bound to a component
/// class.
pub struct ComponentDescriptor {
    pub tag_name: Rc<str>,
    pub svg: bool,
    pub canvas: bool,
    pub enable_back_ref: bool,
    pub recycle_limit: Option<usize>,
    pub init: Option<Box<dyn Fn(&ComponentHandle)>>,
    pub update: Box<dyn Fn(&ComponentHandle) -> Result<()>>,
    pub attached: Option<Box<dyn Fn(&ComponentHandle)>>,
    pub detached: Option<Box<dyn Fn(&ComponentHandle)>>,
    pub disposed: Option<Box<dyn Fn(&ComponentHandle)>>,
    /// Returns whether the new data differs from the old (default
    /// comparator for `setData`); descriptors may override entirely.
    pub new_props_received: Option<Box<dyn Fn(&DataBox, &DataBox) -> bool>>,
    pub v_render: Option<Box<dyn Fn(&ComponentHandle) -> VNode>>,
    pub create_delegated_event_handler: Option<Box<dyn Fn(&ComponentHandle, &str)>>,
}

pub struct ComponentDescriptorBuilder {
    tag_name: Rc<str>,
    svg: bool,
    canvas: bool,
    enable_back_ref: bool,
    recycle_limit: Option<usize>,
    init: Option<Box<dyn Fn(&ComponentHandle)>>,
    update: Option<Box<dyn Fn(&ComponentHandle) -> Result<()>>>,
    attached: Option<Box<dyn Fn(&ComponentHandle)>>,
    detached: Option<Box<dyn Fn(&ComponentHandle)>>,
    disposed: Option<Box<dyn Fn(&ComponentHandle)>>,
    new_props_received: Option<Box<dyn Fn(&DataBox, &DataBox) -> bool>>,
    v_render: Option<Box<dyn Fn(&ComponentHandle) -> VNode>>,
    create_delegated_event_handler: Option<Box<dyn Fn(&ComponentHandle, &str)>>,
}

impl ComponentDescriptorBuilder {
    pub fn new(tag_name: impl Into<Rc<str>>) -> Self {
        ComponentDescriptorBuilder {
            tag_name: tag_name.into(),
            svg: false,
            canvas: false,
            enable_back_ref: false,
            recycle_limit: None,
            init: None,
            update: None,
            attached: None,
            detached: None,
            disposed: None,
            new_props_received: None,
            v_render: None,
            create_delegated_event_handler: None,
        }
    }

    pub fn svg(mut self, v: bool) -> Self {
        self.svg = v;
        self
    }

    pub fn canvas(mut self, v: bool) -> Self {
        self.canvas = v;
        self
    }

    pub fn enable_back_ref(mut self, v: bool) -> Self {
        self.enable_back_ref = v;
        self
    }

    pub fn enable_component_recycling(mut self, max: usize) -> Self {
        self.recycle_limit = Some(max);
        self
    }

    pub fn init(mut self, f: impl Fn(&ComponentHandle) + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn update(mut self, f: impl Fn(&ComponentHandle) -> Result<()> + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn attached(mut self, f: impl Fn(&ComponentHandle) + 'static) -> Self {
        self.attached = Some(Box::new(f));
        self
    }

    pub fn detached(mut self, f: impl Fn(&ComponentHandle) + 'static) -> Self {
        self.detached = Some(Box::new(f));
        self
    }

    pub fn disposed(mut self, f: impl Fn(&ComponentHandle) + 'static) -> Self {
        self.disposed = Some(Box::new(f));
        self
    }

    pub fn new_props_received(mut self, f: impl Fn(&DataBox, &DataBox) -> bool + 'static) -> Self {
        self.new_props_received = Some(Box::new(f));
        self
    }

    pub fn v_render(mut self, f: impl Fn(&ComponentHandle) -> VNode + 'static) -> Self {
        self.v_render = Some(Box::new(f));
        self
    }

    pub fn create_delegated_event_handler(
        mut self,
        f: impl Fn(&ComponentHandle, &str) + 'static,
    ) -> Self {
        self.create_delegated_event_handler = Some(Box::new(f));
        self
    }

    /// Builds the descriptor. Returns the freshly constructed value -
    /// there is no "return the input instead" bug path to guard against
    /// here since Rust's ownership rules make that impossible by
    /// construction (see DESIGN.md's note on this open question).
    pub fn build(self) -> Rc<ComponentDescriptor> {
        Rc::new(ComponentDescriptor {
            tag_name: self.tag_name,
            svg: self.svg,
            canvas: self.canvas,
            enable_back_ref: self.enable_back_ref,
            recycle_limit: self.recycle_limit,
            init: self.init,
            update: self
                .update
                .unwrap_or_else(|| Box::new(|_: &ComponentHandle| Ok(()))),
            attached: self.attached,
            detached: self.detached,
            disposed: self.disposed,
            new_props_received: self.new_props_received,
            v_render: self.v_render,
            create_delegated_event_handler: self.create_delegated_event_handler,
        })
    }
}

type SubList = SmallVec<[SubscriptionHandle; 1]>;

struct ComponentState {
    flags: Cell<ComponentFlags>,
    id: ScopeId,
    descriptor: Rc<ComponentDescriptor>,
    parent: Option<Weak<RefCell<ComponentState>>>,
    depth: usize,
    data: RefCell<DataBox>,
    state: RefCell<Option<Box<dyn Any>>>,
    children: RefCell<Option<DataBox>>,
    element: Cell<ElementId>,
    root: RefCell<Option<VNode>>,
    mtime: Cell<u64>,
    permanent_subs: RefCell<SubList>,
    transient_subs: RefCell<SubList>,
}

/// A reference-counted handle to a live component. Cheap to clone;
/// equality for scheduling/cancellation purposes is pointer identity.
#[derive(Clone)]
pub struct ComponentHandle(Rc<RefCell<ComponentState>>);

impl ComponentHandle {
    /// Allocates a component. `Component` is decoupled from any specific
    /// `DomApi` backend type, so `element` must already have been created
    /// by the caller (the reconciler, typically, using the descriptor's
    /// tag/svg flag).
    pub fn create(
        scheduler: &Scheduler,
        descriptor: Rc<ComponentDescriptor>,
        data: DataBox,
        children: Option<DataBox>,
        parent: Option<&ComponentHandle>,
        element: ElementId,
    ) -> Self {
        let depth = parent.map(|p| p.depth() + 1).unwrap_or(0);
        // A freshly created component always needs its first render;
        // `update()` is otherwise guarded by `dirty ∧ attached`.
        let mut flags = ComponentFlags::DIRTY;
        if descriptor.svg {
            flags |= ComponentFlags::SVG;
        }
        let state = ComponentState {
            flags: Cell::new(flags),
            id: scheduler.next_scope_id(),
            descriptor,
            parent: parent.map(|p| Rc::downgrade(&p.0)),
            depth,
            data: RefCell::new(data),
            state: RefCell::new(None),
            children: RefCell::new(children),
            element: Cell::new(element),
            root: RefCell::new(None),
            mtime: Cell::new(0),
            permanent_subs: RefCell::new(SmallVec::new()),
            transient_subs: RefCell::new(SmallVec::new()),
        };
        let handle = ComponentHandle(Rc::new(RefCell::new(state)));
        if let Some(init) = handle.0.borrow().descriptor.init.as_ref() {
            init(&handle);
        }
        handle
    }

    /// Like `create`, but marks the component as mounting: the first root
    /// binding after this must walk existing DOM via `reconciler::mount`
    /// rather than render fresh, before switching to the normal sync path.
    pub fn mount(
        scheduler: &Scheduler,
        descriptor: Rc<ComponentDescriptor>,
        data: DataBox,
        children: Option<DataBox>,
        parent: Option<&ComponentHandle>,
        element: ElementId,
    ) -> Self {
        let handle = Self::create(scheduler, descriptor, data, children, parent, element);
        handle.set_flag(ComponentFlags::MOUNTING, true);
        handle
    }

    pub fn id(&self) -> ScopeId {
        self.0.borrow().id
    }

    pub fn depth(&self) -> usize {
        self.0.borrow().depth
    }

    pub fn element(&self) -> ElementId {
        self.0.borrow().element.get()
    }

    pub fn is_mounting(&self) -> bool {
        self.flags().contains(ComponentFlags::MOUNTING)
    }

    pub fn clear_mounting(&self) {
        self.set_flag(ComponentFlags::MOUNTING, false);
    }

    pub fn is_attached(&self) -> bool {
        self.flags().contains(ComponentFlags::ATTACHED)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags().contains(ComponentFlags::DIRTY)
    }

    pub fn is_disposed(&self) -> bool {
        self.flags().contains(ComponentFlags::DISPOSED)
    }

    pub fn data(&self) -> DataBox {
        self.0.borrow().data.borrow().clone()
    }

    pub fn children(&self) -> Option<DataBox> {
        self.0.borrow().children.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &ComponentHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn flags(&self) -> ComponentFlags {
        self.0.borrow().flags.get()
    }

    fn set_flag(&self, flag: ComponentFlags, on: bool) {
        let state = self.0.borrow();
        let mut f = state.flags.get();
        if on {
            f |= flag;
        } else {
            f.remove(flag);
        }
        state.flags.set(f);
    }

    pub fn parent(&self) -> Option<ComponentHandle> {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(ComponentHandle)
    }

    /// Guarded by `dirty ∧ attached`. Invokes the descriptor's `update`,
    /// clears dirty, stamps `mtime` with the scheduler's current clock.
    pub fn update(&self, scheduler: &Scheduler) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::ComponentDisposed);
        }
        if !(self.is_dirty() && self.is_attached()) {
            return Ok(());
        }
        let descriptor = self.0.borrow().descriptor.clone();
        (descriptor.update)(self)?;
        self.set_flag(ComponentFlags::DIRTY, false);
        self.0.borrow().mtime.set(scheduler.clock());
        Ok(())
    }

    /// Called by the scheduler when this component is popped off a write
    /// queue; swallows descriptor errors into a log line rather than
    /// propagating past the frame boundary entry point (see
    /// `crate::error` module docs on descriptor-failure propagation).
    pub(crate) fn run_scheduled_update(&self, scheduler: &Scheduler) {
        self.set_flag(ComponentFlags::IN_UPDATE_QUEUE, false);
        if let Err(err) = self.update(scheduler) {
            log::error!("component update failed: {err}");
        }
    }

    pub(crate) fn mark_dirty_for_frame(&self) {
        self.set_flag(ComponentFlags::DIRTY, true);
    }

    pub(crate) fn wants_update_each_frame(&self) -> bool {
        !self.is_disposed() && self.flags().contains(ComponentFlags::UPDATE_EACH_FRAME)
    }

    /// Sets the component's root VNode, mounting on first use and syncing
    /// thereafter. The reconciler (generic over a `DomApi` backend)
    /// performs the actual mount/sync walk; this just records bookkeeping
    /// a DOM-agnostic `Component` can own directly.
    pub fn take_previous_root(&self) -> Option<VNode> {
        self.0.borrow().root.borrow_mut().take()
    }

    pub fn set_root(&self, new_root: VNode) {
        new_root.set_component(self.clone());
        *self.0.borrow().root.borrow_mut() = Some(new_root);
    }

    pub fn invalidate(&self, scheduler: &Scheduler) {
        if self.is_dirty() || self.is_disposed() {
            return;
        }
        self.set_flag(ComponentFlags::DIRTY, true);
        self.cancel_transient_subscriptions();
        let flags = self.flags();
        if !flags.contains(ComponentFlags::IN_UPDATE_QUEUE) {
            self.set_flag(ComponentFlags::IN_UPDATE_QUEUE, true);
            scheduler.next_frame().update_component(self.clone());
        }
    }

    pub fn attach(&self) {
        self.set_flag(ComponentFlags::ATTACHED, true);
        let descriptor = self.0.borrow().descriptor.clone();
        if let Some(cb) = descriptor.attached.as_ref() {
            cb(self);
        }
    }

    pub fn detach(&self) {
        self.set_flag(ComponentFlags::ATTACHED, false);
        let descriptor = self.0.borrow().descriptor.clone();
        if let Some(cb) = descriptor.detached.as_ref() {
            cb(self);
        }
    }

    /// Cancels all subscriptions, disposes the root VNode (if one was ever
    /// rendered) via `dispose_root`, invokes the descriptor's `disposed`
    /// callback, then reclaims the scope id. `dispose_root` is injected
    /// rather than called directly since component state is decoupled from
    /// any `DomApi` backend; the reconciler supplies the real
    /// implementation (recursing back into its own `dispose`).
    pub fn dispose(&self, scheduler: &Scheduler, dispose_root: impl FnOnce(VNode) -> Result<()>) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::DoubleDispose);
        }
        self.set_flag(ComponentFlags::DISPOSED, true);
        self.set_flag(ComponentFlags::ATTACHED, false);
        self.set_flag(ComponentFlags::UPDATE_EACH_FRAME, false);
        self.cancel_all_subscriptions();
        if let Some(root) = self.take_previous_root() {
            dispose_root(root)?;
        }
        let descriptor = self.0.borrow().descriptor.clone();
        if let Some(cb) = descriptor.disposed.as_ref() {
            cb(self);
        }
        scheduler.reclaim_scope_id(self.id());
        Ok(())
    }

    /// Default `setData`: marks dirty if the descriptor's comparator (or
    /// pointer identity, if none supplied) says the value changed.
    pub fn set_data(&self, new_data: DataBox, scheduler: &Scheduler) {
        let descriptor = self.0.borrow().descriptor.clone();
        let changed = {
            let old = self.0.borrow().data.borrow().clone();
            match descriptor.new_props_received.as_ref() {
                Some(cmp) => cmp(&old, &new_data),
                None => !Rc::ptr_eq(&old, &new_data),
            }
        };
        *self.0.borrow().data.borrow_mut() = new_data;
        if changed {
            self.invalidate(scheduler);
        }
    }

    pub fn set_children(&self, new_children: Option<DataBox>, scheduler: &Scheduler) {
        let changed = {
            let old = self.0.borrow().children.borrow().clone();
            match (&old, &new_children) {
                (None, None) => false,
                (Some(a), Some(b)) => !Rc::ptr_eq(a, b),
                _ => true,
            }
        };
        *self.0.borrow().children.borrow_mut() = new_children;
        if changed {
            self.invalidate(scheduler);
        }
    }

    pub fn subscribe(&self, invalidator: &Rc<Invalidator>) {
        let sub = Invalidator::subscribe(invalidator, Subscriber::Component(self.clone()), false);
        self.0.borrow().permanent_subs.borrow_mut().push(sub);
    }

    pub fn transient_subscribe(&self, invalidator: &Rc<Invalidator>) {
        let sub = Invalidator::subscribe(invalidator, Subscriber::Component(self.clone()), true);
        self.0.borrow().transient_subs.borrow_mut().push(sub);
    }

    fn cancel_transient_subscriptions(&self) {
        let taken: SubList = std::mem::take(&mut *self.0.borrow().transient_subs.borrow_mut());
        for sub in taken.iter() {
            debug_invariant!(cancel_subscription(sub).is_ok(), "subscription already canceled");
        }
    }

    fn cancel_all_subscriptions(&self) {
        self.cancel_transient_subscriptions();
        let taken: SubList = std::mem::take(&mut *self.0.borrow().permanent_subs.borrow_mut());
        for sub in taken.iter() {
            debug_invariant!(cancel_subscription(sub).is_ok(), "subscription already canceled");
        }
    }

    pub fn start_update_each_frame(&self, scheduler: &Scheduler) {
        let already = self.flags().contains(ComponentFlags::UPDATE_EACH_FRAME);
        self.set_flag(ComponentFlags::UPDATE_EACH_FRAME, true);
        if !already {
            scheduler.start_update_each_frame(self.clone());
        }
    }

    pub fn stop_update_each_frame(&self, scheduler: &Scheduler) {
        self.set_flag(ComponentFlags::UPDATE_EACH_FRAME, false);
        scheduler.stop_update_each_frame(self);
    }
}

impl From<ComponentHandle> for WriteTask {
    fn from(c: ComponentHandle) -> Self {
        WriteTask::Component(c)
    }
}
