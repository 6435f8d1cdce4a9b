//! The seam between the reconciler and a concrete rendering target.
//!
//! `DomApi` calls are immediate mutations rather than an edit-log/replay
//! design, since the keyed-diff algorithm in `crate::reconciler` needs to
//! read back sibling positions while it is still diffing, which an
//! append-only edit log cannot answer.

use fxhash::FxHashMap;

use crate::arena::ElementId;

/// Every primitive DOM edit the reconciler needs. A renderer backend
/// (a web target, a native target, an in-memory test double) implements
/// this trait; the reconciler itself is generic over `D: DomApi`.
pub trait DomApi {
    fn create_element(&mut self, tag: &str) -> ElementId;
    fn create_element_ns(&mut self, tag: &str, ns: &str) -> ElementId;
    fn create_text_node(&mut self, text: &str) -> ElementId;
    /// A zero-width marker, used for keep-alive slots and empty fragments.
    fn create_placeholder(&mut self) -> ElementId;

    fn set_text(&mut self, node: ElementId, text: &str);

    fn set_attribute(&mut self, node: ElementId, name: &str, value: &str, ns: Option<&str>);
    fn remove_attribute(&mut self, node: ElementId, name: &str, ns: Option<&str>);

    fn set_property(&mut self, node: ElementId, name: &str, value: &str);

    fn set_style_text(&mut self, node: ElementId, css_text: &str);
    fn set_style_property(&mut self, node: ElementId, name: &str, value: &str);
    fn remove_style_property(&mut self, node: ElementId, name: &str);

    fn set_class_name(&mut self, node: ElementId, class_name: &str);

    fn add_event_listener(&mut self, node: ElementId, event: &str);
    fn remove_event_listener(&mut self, node: ElementId, event: &str);

    /// Mirrors native `Node.appendChild`: if `child` is already attached
    /// elsewhere, it is detached first. The keyed-children algorithm
    /// relies on this to reposition existing nodes without an explicit
    /// "move" primitive.
    fn append_child(&mut self, parent: ElementId, child: ElementId);
    /// Mirrors native `Node.insertBefore`; see `append_child`.
    fn insert_before(&mut self, parent: ElementId, child: ElementId, before: ElementId);
    fn remove_child(&mut self, parent: ElementId, child: ElementId);
    fn replace_child(&mut self, parent: ElementId, old: ElementId, new: ElementId);

    /// Walk to the next sibling of `node`, used by the mount protocol.
    fn next_sibling(&self, node: ElementId) -> Option<ElementId>;
    /// Walk to the first child of `node`, used by the mount protocol.
    fn first_child(&self, node: ElementId) -> Option<ElementId>;
    fn parent(&self, node: ElementId) -> Option<ElementId>;

    /// Whether `node` is a comment node. Mounting strips comment nodes used
    /// as text-node separators in pre-rendered markup.
    fn is_comment(&self, node: ElementId) -> bool;

    /// Whether `node` is an element with the given tag name. Used by the
    /// mount protocol to validate that pre-rendered markup has the shape
    /// the virtual tree expects.
    fn tag_matches(&self, node: ElementId, tag: &str) -> bool;
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, ns: Option<String> },
    Text(String),
    Comment,
    Placeholder,
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    kind_text: String,
    attrs: FxHashMap<String, String>,
    props: FxHashMap<String, String>,
    style_text: String,
    style_props: FxHashMap<String, String>,
    class_name: String,
    listeners: FxHashMap<String, u32>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory recording DOM used by this crate's own test suite, and a
/// template for real backends: every mutation is both applied to the node
/// table and appended to `call_log` so tests can assert on exact DOM-call
/// sequences.
#[derive(Default)]
pub struct TestDom {
    nodes: Vec<Option<NodeKind>>,
    data: Vec<NodeData>,
    pub call_log: Vec<String>,
}

impl TestDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: NodeKind) -> ElementId {
        self.nodes.push(Some(kind));
        self.data.push(NodeData::default());
        ElementId(self.nodes.len() - 1)
    }

    /// Synthesizes a comment node, standing in for the text-node separators
    /// a real SSR renderer would have already emitted. Not part of `DomApi`
    /// itself: no backend ever needs to create one, only to recognize one
    /// it's handed during mount.
    pub fn create_comment(&mut self) -> ElementId {
        self.push(NodeKind::Comment)
    }

    pub fn tag_of(&self, node: ElementId) -> Option<&str> {
        match self.nodes.get(node.0)?.as_ref()? {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn text_of(&self, node: ElementId) -> Option<&str> {
        match self.nodes.get(node.0)?.as_ref()? {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn attr(&self, node: ElementId, name: &str) -> Option<&str> {
        self.data.get(node.0)?.attrs.get(name).map(|s| s.as_str())
    }

    pub fn style_prop(&self, node: ElementId, name: &str) -> Option<&str> {
        self.data
            .get(node.0)?
            .style_props
            .get(name)
            .map(|s| s.as_str())
    }

    pub fn class_name(&self, node: ElementId) -> &str {
        self.data
            .get(node.0)
            .map(|d| d.class_name.as_str())
            .unwrap_or_default()
    }

    pub fn children_of(&self, node: ElementId) -> &[ElementId] {
        self.data
            .get(node.0)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    fn unlink(&mut self, parent: ElementId, child: ElementId) {
        if let Some(d) = self.data.get_mut(parent.0) {
            d.children.retain(|c| *c != child);
        }
    }
}

impl DomApi for TestDom {
    fn create_element(&mut self, tag: &str) -> ElementId {
        self.call_log.push(format!("create_element {tag}"));
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            ns: None,
        })
    }

    fn create_element_ns(&mut self, tag: &str, ns: &str) -> ElementId {
        self.call_log.push(format!("create_element_ns {tag} {ns}"));
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            ns: Some(ns.to_string()),
        })
    }

    fn create_text_node(&mut self, text: &str) -> ElementId {
        self.call_log.push(format!("create_text_node {text}"));
        self.push(NodeKind::Text(text.to_string()))
    }

    fn create_placeholder(&mut self) -> ElementId {
        self.call_log.push("create_placeholder".to_string());
        self.push(NodeKind::Placeholder)
    }

    fn set_text(&mut self, node: ElementId, text: &str) {
        self.call_log.push(format!("set_text {} {text}", node.0));
        if let Some(Some(NodeKind::Text(t))) = self.nodes.get_mut(node.0) {
            *t = text.to_string();
        }
    }

    fn set_attribute(&mut self, node: ElementId, name: &str, value: &str, ns: Option<&str>) {
        self.call_log
            .push(format!("set_attribute {} {name}={value} ns={ns:?}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: ElementId, name: &str, ns: Option<&str>) {
        self.call_log
            .push(format!("remove_attribute {} {name} ns={ns:?}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.attrs.remove(name);
        }
    }

    fn set_property(&mut self, node: ElementId, name: &str, value: &str) {
        self.call_log
            .push(format!("set_property {} {name}={value}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.props.insert(name.to_string(), value.to_string());
        }
    }

    fn set_style_text(&mut self, node: ElementId, css_text: &str) {
        self.call_log
            .push(format!("set_style_text {} {css_text}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.style_text = css_text.to_string();
        }
    }

    fn set_style_property(&mut self, node: ElementId, name: &str, value: &str) {
        self.call_log
            .push(format!("set_style_property {} {name}={value}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.style_props.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_style_property(&mut self, node: ElementId, name: &str) {
        self.call_log
            .push(format!("remove_style_property {} {name}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.style_props.remove(name);
        }
    }

    fn set_class_name(&mut self, node: ElementId, class_name: &str) {
        self.call_log
            .push(format!("set_class_name {} {class_name}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.class_name = class_name.to_string();
        }
    }

    fn add_event_listener(&mut self, node: ElementId, event: &str) {
        self.call_log
            .push(format!("add_event_listener {} {event}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            *d.listeners.entry(event.to_string()).or_insert(0) += 1;
        }
    }

    fn remove_event_listener(&mut self, node: ElementId, event: &str) {
        self.call_log
            .push(format!("remove_event_listener {} {event}", node.0));
        if let Some(d) = self.data.get_mut(node.0) {
            d.listeners.remove(event);
        }
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.call_log
            .push(format!("append_child {} {}", parent.0, child.0));
        if let Some(old_parent) = self.data.get(child.0).and_then(|d| d.parent) {
            self.unlink(old_parent, child);
        }
        if let Some(d) = self.data.get_mut(parent.0) {
            d.children.push(child);
        }
        if let Some(d) = self.data.get_mut(child.0) {
            d.parent = Some(parent);
        }
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, before: ElementId) {
        self.call_log
            .push(format!("insert_before {} {} {}", parent.0, child.0, before.0));
        if let Some(old_parent) = self.data.get(child.0).and_then(|d| d.parent) {
            self.unlink(old_parent, child);
        }
        if let Some(d) = self.data.get_mut(parent.0) {
            let idx = d.children.iter().position(|c| *c == before).unwrap_or(d.children.len());
            d.children.insert(idx, child);
        }
        if let Some(d) = self.data.get_mut(child.0) {
            d.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: ElementId, child: ElementId) {
        self.call_log
            .push(format!("remove_child {} {}", parent.0, child.0));
        self.unlink(parent, child);
    }

    fn replace_child(&mut self, parent: ElementId, old: ElementId, new: ElementId) {
        self.call_log
            .push(format!("replace_child {} {} {}", parent.0, old.0, new.0));
        if let Some(d) = self.data.get_mut(parent.0) {
            if let Some(idx) = d.children.iter().position(|c| *c == old) {
                d.children[idx] = new;
            }
        }
        if let Some(d) = self.data.get_mut(new.0) {
            d.parent = Some(parent);
        }
    }

    fn next_sibling(&self, node: ElementId) -> Option<ElementId> {
        let parent = self.data.get(node.0)?.parent?;
        let siblings = &self.data.get(parent.0)?.children;
        let idx = siblings.iter().position(|c| *c == node)?;
        siblings.get(idx + 1).copied()
    }

    fn first_child(&self, node: ElementId) -> Option<ElementId> {
        self.data.get(node.0)?.children.first().copied()
    }

    fn parent(&self, node: ElementId) -> Option<ElementId> {
        self.data.get(node.0)?.parent
    }

    fn is_comment(&self, node: ElementId) -> bool {
        matches!(self.nodes.get(node.0), Some(Some(NodeKind::Comment)))
    }

    fn tag_matches(&self, node: ElementId, tag: &str) -> bool {
        self.tag_of(node) == Some(tag)
    }
}
