//! Virtual node data model: a `Text`/`Element`/`Component`/`Root` variant
//! dispatch, with a `Cell<ElementId>` slot holding the live DOM/component
//! reference once created.

pub mod attrs;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::arena::ElementId;
use crate::component::{ComponentDescriptor, ComponentHandle};
use crate::macros::bitflags_lite;
use attrs::{AttrMap, ClassValue, PropMap, StyleValue};

/// Sibling-unique identifier used by the keyed-children algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(u64),
    Str(String),
}

impl From<u64> for Key {
    fn from(v: u64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

bitflags_lite! {
    /// Modifier bits orthogonal to the node's variant. Two VNodes are
    /// "compatible for sync" only if these, the tag/descriptor, `type_`,
    /// and key all match (see `crate::reconciler::compatible`).
    pub struct VNodeFlags: u16 {
        const SVG                = 1 << 0;
        const TRACK_BY_KEY       = 1 << 1;
        const KEEP_ALIVE         = 1 << 2;
        const BIND_ONCE          = 1 << 3;
        const MANAGED_CONTAINER  = 1 << 4;
        const DYNAMIC_SHAPE      = 1 << 5;
        const DISABLE_SHAPE_ERR  = 1 << 6;
    }
}

/// A child list is either a single text payload or an ordered list of
/// child VNodes; mixing is handled explicitly by the reconciler
/// (`crate::reconciler::children`), not encoded in the type.
#[derive(Debug, Clone)]
pub enum Children {
    Text(String),
    Nodes(Vec<VNode>),
}

impl Children {
    pub fn is_empty(&self) -> bool {
        match self {
            Children::Text(t) => t.is_empty(),
            Children::Nodes(n) => n.is_empty(),
        }
    }
}

/// Per-operation hooks overriding the reconciler's default child-list
/// operations for an element, attached via `VNode::managed_container`.
/// Any hook left `None` falls back to the corresponding `DomApi` call and
/// logs a warning to flag the fallback — the same `Option<Box<dyn Fn>>`
/// shape `ComponentDescriptor`'s own callback slots use, chosen here (over
/// a trait with defaulted methods) specifically so "hook not provided" is
/// observable at the call site.
#[derive(Default)]
pub struct ContainerManager {
    pub insert_child: Option<Box<dyn Fn(usize, ElementId)>>,
    pub remove_child: Option<Box<dyn Fn(usize, ElementId)>>,
    pub move_child: Option<Box<dyn Fn(usize, usize)>>,
    pub replace_child: Option<Box<dyn Fn(usize, ElementId, ElementId)>>,
}

#[derive(Clone)]
pub struct ElementData {
    pub tag: Rc<str>,
    pub type_: Option<Rc<str>>,
    pub attrs: Option<AttrMap>,
    pub props: Option<PropMap>,
    pub style: Option<StyleValue>,
    pub classes: Option<ClassValue>,
    pub children: Children,
    pub container_manager: Option<Rc<ContainerManager>>,
}

#[derive(Clone)]
pub struct ComponentData {
    pub descriptor: Rc<ComponentDescriptor>,
    pub data: Rc<dyn std::any::Any>,
    pub children: Option<Box<Children>>,
}

#[derive(Clone)]
pub enum VNodeKind {
    Text(String),
    Element(ElementData),
    Component(ComponentData),
    /// A component's own root subtree. Behaves like `Element` but inherits
    /// the hosting element from the owning component rather than creating
    /// its own.
    Root(ElementData),
}

/// One node in a virtual tree.
///
/// `ref_` and `cref` are non-owning back-references populated after
/// create/mount and cleared on dispose, so neither one keeps the live DOM
/// node or component alive on its own.
pub struct VNode {
    pub flags: VNodeFlags,
    pub key: Option<Key>,
    pub ref_: Cell<Option<ElementId>>,
    pub cref: RefCell<Option<ComponentHandle>>,
    cached_class_name: RefCell<Option<String>>,
    pub kind: VNodeKind,
}

impl VNode {
    fn new(flags: VNodeFlags, kind: VNodeKind) -> Self {
        VNode {
            flags,
            key: None,
            ref_: Cell::new(None),
            cref: RefCell::new(None),
            cached_class_name: RefCell::new(None),
            kind,
        }
    }

    pub fn component(&self) -> Option<ComponentHandle> {
        self.cref.borrow().clone()
    }

    pub fn set_component(&self, handle: ComponentHandle) {
        *self.cref.borrow_mut() = Some(handle);
    }

    pub fn create_text(text: impl Into<String>) -> Self {
        Self::new(VNodeFlags::empty(), VNodeKind::Text(text.into()))
    }

    pub fn create_element(tag: impl Into<Rc<str>>) -> Self {
        Self::new(
            VNodeFlags::empty(),
            VNodeKind::Element(ElementData {
                tag: tag.into(),
                type_: None,
                attrs: None,
                props: None,
                style: None,
                classes: None,
                children: Children::Nodes(Vec::new()),
                container_manager: None,
            }),
        )
    }

    pub fn create_svg_element(tag: impl Into<Rc<str>>) -> Self {
        let mut v = Self::create_element(tag);
        v.flags |= VNodeFlags::SVG;
        v
    }

    pub fn create_component(descriptor: Rc<ComponentDescriptor>, data: Rc<dyn std::any::Any>) -> Self {
        Self::new(
            VNodeFlags::empty(),
            VNodeKind::Component(ComponentData {
                descriptor,
                data,
                children: None,
            }),
        )
    }

    pub fn create_root() -> Self {
        Self::new(
            VNodeFlags::empty(),
            VNodeKind::Root(ElementData {
                tag: Rc::from(""),
                type_: None,
                attrs: None,
                props: None,
                style: None,
                classes: None,
                children: Children::Nodes(Vec::new()),
                container_manager: None,
            }),
        )
    }

    // ---- builder surface ----

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn type_(mut self, t: impl Into<Rc<str>>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.type_ = Some(t.into());
        }
        self
    }

    pub fn attrs(mut self, attrs: AttrMap) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.attrs = Some(attrs);
        }
        self
    }

    pub fn props(mut self, props: PropMap) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.props = Some(props);
        }
        self
    }

    pub fn style(mut self, style: StyleValue) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.style = Some(style);
        }
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.classes = Some(ClassValue::Name(class_name.into()));
        }
        self
    }

    pub fn classes(mut self, classes: Vec<String>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.classes = Some(ClassValue::List(classes));
        }
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            if let Children::Nodes(v) = &mut e.children {
                v.push(child);
            }
        }
        self
    }

    pub fn children(mut self, children: Vec<VNode>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.children = Children::Nodes(children);
        }
        self
    }

    pub fn text_children(mut self, text: impl Into<String>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.children = Children::Text(text.into());
        }
        self
    }

    pub fn track_by_key_children(mut self) -> Self {
        self.flags |= VNodeFlags::TRACK_BY_KEY;
        self
    }

    pub fn managed_container(mut self, manager: Rc<ContainerManager>) -> Self {
        if let VNodeKind::Element(e) | VNodeKind::Root(e) = &mut self.kind {
            e.container_manager = Some(manager);
            self.flags |= VNodeFlags::MANAGED_CONTAINER;
        }
        self
    }

    pub fn keep_alive(mut self) -> Self {
        self.flags |= VNodeFlags::KEEP_ALIVE;
        self
    }

    pub fn bind_once(mut self) -> Self {
        self.flags |= VNodeFlags::BIND_ONCE;
        self
    }

    pub fn dynamic_shape_attrs(mut self) -> Self {
        self.flags |= VNodeFlags::DYNAMIC_SHAPE;
        self
    }

    pub fn disable_children_shape_error(mut self) -> Self {
        self.flags |= VNodeFlags::DISABLE_SHAPE_ERR;
        self
    }

    // ---- queries ----

    pub fn is_svg(&self) -> bool {
        self.flags.contains(VNodeFlags::SVG)
    }

    pub fn is_track_by_key(&self) -> bool {
        self.flags.contains(VNodeFlags::TRACK_BY_KEY)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.flags.contains(VNodeFlags::KEEP_ALIVE)
    }

    pub fn is_disable_children_shape_error(&self) -> bool {
        self.flags.contains(VNodeFlags::DISABLE_SHAPE_ERR)
    }

    pub fn is_bind_once(&self) -> bool {
        self.flags.contains(VNodeFlags::BIND_ONCE)
    }

    /// className for an element whose `type_` carries an immutable class
    /// prefix, lazily combined with the current class list and cached
    /// until the node is resynced.
    pub fn cached_class_name(&self, computed: impl FnOnce() -> String) -> String {
        if let Some(cached) = self.cached_class_name.borrow().as_ref() {
            return cached.clone();
        }
        let computed = computed();
        *self.cached_class_name.borrow_mut() = Some(computed.clone());
        computed
    }

    pub fn invalidate_cached_class_name(&self) {
        *self.cached_class_name.borrow_mut() = None;
    }
}
