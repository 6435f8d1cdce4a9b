//! Broadcast signal source with permanent/transient subscribers. Carries no
//! payload; firing is the message. The subscription lists use `smallvec` so
//! the common zero-or-one-subscriber case needs no heap allocation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::component::ComponentHandle;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;

pub enum Subscriber {
    Component(ComponentHandle),
    Callback(RefCell<Box<dyn FnMut()>>),
}

impl Subscriber {
    fn fire(&self, scheduler: &Scheduler) {
        match self {
            Subscriber::Component(c) => c.invalidate(scheduler),
            Subscriber::Callback(cb) => (cb.borrow_mut())(),
        }
    }

}

pub struct SubscriptionRecord {
    pub transient: bool,
    pub subscriber: Subscriber,
    /// Back-reference so the subscriber side can detach itself from the
    /// invalidator (e.g. a component canceling its transient subscriptions
    /// on invalidate/dispose).
    invalidator: Weak<Invalidator>,
    cancelled: std::cell::Cell<bool>,
}

impl SubscriptionRecord {
    fn new(transient: bool, subscriber: Subscriber, invalidator: Weak<Invalidator>) -> Self {
        SubscriptionRecord {
            transient,
            subscriber,
            invalidator,
            cancelled: std::cell::Cell::new(false),
        }
    }
}

pub type SubscriptionHandle = Rc<SubscriptionRecord>;

/// Detaches a subscription from whichever invalidator list it lives on.
/// Returns `Err(Error::DoubleCancel)` if this subscription was already
/// canceled; a no-op (but not an error) if the invalidator itself has
/// already been dropped.
pub fn cancel_subscription(sub: &SubscriptionHandle) -> Result<()> {
    if sub.cancelled.replace(true) {
        return Err(Error::DoubleCancel);
    }
    if let Some(invalidator) = sub.invalidator.upgrade() {
        invalidator.remove_subscription(sub);
    }
    Ok(())
}

type SubList = SmallVec<[SubscriptionHandle; 1]>;

/// A pub/sub signal point. Carries no payload; firing is the message.
pub struct Invalidator {
    mtime: std::cell::Cell<u64>,
    permanent: RefCell<SubList>,
    transient: RefCell<SubList>,
}

impl Default for Invalidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidator {
    pub fn new() -> Self {
        Invalidator {
            mtime: std::cell::Cell::new(0),
            permanent: RefCell::new(SmallVec::new()),
            transient: RefCell::new(SmallVec::new()),
        }
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn mtime(&self) -> u64 {
        self.mtime.get()
    }

    fn list_for(&self, transient: bool) -> &RefCell<SubList> {
        if transient {
            &self.transient
        } else {
            &self.permanent
        }
    }

    /// Creates and registers a subscription for `subscriber`. `self_rc`
    /// must be the same allocation as `self` (a `Weak` is derived from
    /// it for later cancellation).
    pub fn subscribe(
        self_rc: &Rc<Invalidator>,
        subscriber: Subscriber,
        transient: bool,
    ) -> SubscriptionHandle {
        let sub = Rc::new(SubscriptionRecord::new(transient, subscriber, Rc::downgrade(self_rc)));
        self_rc.list_for(transient).borrow_mut().push(sub.clone());
        sub
    }

    /// O(1) swap-with-last removal.
    pub fn remove_subscription(&self, sub: &SubscriptionHandle) {
        let list = self.list_for(sub.transient);
        let mut list = list.borrow_mut();
        if let Some(idx) = list.iter().position(|s| Rc::ptr_eq(s, sub)) {
            list.swap_remove(idx);
        }
    }

    /// Fires every permanent subscription, then atomically detaches and
    /// fires the transient list. The `mtime` guard prevents re-firing
    /// within the same scheduler tick, protecting against reentrant
    /// invalidation cycles.
    pub fn invalidate(&self, scheduler: &Scheduler) {
        let clock = scheduler.clock();
        if self.mtime.get() >= clock {
            return;
        }
        self.mtime.set(clock);

        for sub in self.permanent.borrow().iter() {
            sub.subscriber.fire(scheduler);
        }

        let fired: SubList = std::mem::take(&mut *self.transient.borrow_mut());
        for sub in fired.iter() {
            sub.subscriber.fire(scheduler);
        }
    }
}
