//! Core reconciler, scheduler, and component model for a virtual-DOM UI
//! runtime: node diffing (including the keyed LIS algorithm), a
//! frame-granular cooperative scheduler, and a component/invalidator
//! pub/sub model, decoupled from any concrete rendering target via
//! [`dom::DomApi`].

pub mod arena;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub(crate) mod macros;
pub mod reconciler;
pub mod scheduler;
pub mod vnode;

pub(crate) mod innerlude {
    pub use crate::arena::*;
    pub use crate::component::invalidator::*;
    pub use crate::component::*;
    pub use crate::config::*;
    pub use crate::dom::*;
    pub use crate::error::*;
    pub use crate::reconciler::*;
    pub use crate::scheduler::*;
    pub use crate::vnode::attrs::*;
    pub use crate::vnode::*;
}

pub use crate::innerlude::{
    cancel_subscription, compatible, AttrMap, Arena, ClassValue, ComponentDescriptor,
    ComponentDescriptorBuilder, ComponentFlags, ComponentHandle, DataBox, ElementData, ElementId,
    Error, Frame, Invalidator, Key, PropMap, Result, Scheduler, SchedulerConfig, ScopeId,
    StyleValue, Subscriber, SubscriptionHandle, TickDriver, VNode, VNodeFlags, VNodeKind,
};

/// Commonly imported items for building/mounting a virtual tree.
pub mod prelude {
    pub use crate::component::{ComponentDescriptorBuilder, ComponentHandle, DataBox};
    pub use crate::config::SchedulerConfig;
    pub use crate::dom::DomApi;
    pub use crate::error::{Error, Result};
    pub use crate::reconciler;
    pub use crate::scheduler::{ManualTickDriver, Scheduler, TickDriver};
    pub use crate::vnode::{Children, Key, VNode};
}
