//! Id newtypes and the generational arenas backing them.

use slab::Slab;

use crate::config::SchedulerConfig;

/// Identifies a live `Component` in the component arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// Identifies a live DOM element handed out by a [`crate::dom::DomApi`]
/// backend. Opaque to the reconciler beyond equality/ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

impl ElementId {
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ElementId({})", self.0)
    }
}

/// Generational arena used for both components and raw element-id
/// allocation.
pub struct Arena<T> {
    slab: Slab<T>,
}

impl<T> Arena<T> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slab: Slab::with_capacity(cap),
        }
    }

    pub fn insert(&mut self, value: T) -> usize {
        self.slab.insert(value)
    }

    pub fn remove(&mut self, id: usize) -> T {
        self.slab.remove(id)
    }

    pub fn try_remove(&mut self, id: usize) -> Option<T> {
        self.slab.try_remove(id)
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.slab.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        self.slab.get_mut(id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.slab.contains(id)
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}

/// Owns the id-allocation arenas for one scheduler instance. Component and
/// element data themselves live in `Rc<RefCell<..>>` handles held by their
/// owners (see `crate::component`); these slabs exist purely to hand out
/// dense, reusable ids.
pub struct ResourcePool {
    pub scope_ids: Arena<()>,
    pub raw_elements: Arena<()>,
}

impl ResourcePool {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            scope_ids: Arena::with_capacity(config.component_slab_capacity),
            raw_elements: Arena::with_capacity(config.element_slab_capacity),
        }
    }

    pub fn next_scope(&mut self) -> ScopeId {
        ScopeId(self.scope_ids.insert(()))
    }

    pub fn reclaim_scope(&mut self, id: ScopeId) {
        self.scope_ids.try_remove(id.0);
    }

    pub fn next_element(&mut self) -> ElementId {
        ElementId(self.raw_elements.insert(()))
    }

    pub fn reclaim_element(&mut self, id: ElementId) {
        self.raw_elements.try_remove(id.0);
    }
}
