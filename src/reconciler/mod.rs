//! Create/render/sync/mount/dispose dispatch over the `VNode` variants. All
//! DOM mutation calls go through `crate::dom::DomApi`, so the reconciler
//! itself never depends on a concrete rendering backend.

pub mod children;

use std::rc::Rc;

use crate::arena::ElementId;
use crate::component::{ComponentDescriptor, ComponentHandle, DataBox};
use crate::debug_invariant;
use crate::dom::DomApi;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::vnode::attrs::{sync_attrs, sync_classes, sync_props, sync_style};
use crate::vnode::{Children, ElementData, VNode, VNodeKind};

/// Two VNodes are compatible for `sync` iff their flags, tag/descriptor,
/// `type_`, and key all match.
pub fn compatible(old: &VNode, new: &VNode) -> bool {
    if old.flags != new.flags || old.key != new.key {
        return false;
    }
    match (&old.kind, &new.kind) {
        (VNodeKind::Text(_), VNodeKind::Text(_)) => true,
        (VNodeKind::Element(a), VNodeKind::Element(b)) | (VNodeKind::Root(a), VNodeKind::Root(b)) => {
            a.tag == b.tag && a.type_ == b.type_
        }
        (VNodeKind::Component(a), VNodeKind::Component(b)) => {
            Rc::ptr_eq(&a.descriptor, &b.descriptor)
        }
        _ => false,
    }
}

/// Allocates the live DOM node (or component) for `vnode` and records it
/// in `vnode.ref_`. Does not populate attributes/children; call `render`
/// afterward.
pub fn create<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    vnode: &VNode,
    parent: Option<&ComponentHandle>,
) -> Result<ElementId> {
    if vnode.ref_.get().is_some() {
        return Err(Error::VNodeReused);
    }
    let id = match &vnode.kind {
        VNodeKind::Text(text) => dom.create_text_node(text),
        VNodeKind::Element(e) | VNodeKind::Root(e) => {
            if e.tag.is_empty() {
                dom.create_placeholder()
            } else if vnode.is_svg() {
                dom.create_element_ns(&e.tag, "http://www.w3.org/2000/svg")
            } else {
                dom.create_element(&e.tag)
            }
        }
        VNodeKind::Component(c) => {
            let element = dom.create_placeholder();
            let children_box: Option<DataBox> = c.children.as_ref().map(|children| {
                Rc::new((**children).clone()) as DataBox
            });
            let handle = ComponentHandle::create(
                scheduler,
                c.descriptor.clone(),
                c.data.clone(),
                children_box,
                parent,
                element,
            );
            vnode.set_component(handle);
            element
        }
    };
    vnode.ref_.set(Some(id));
    Ok(id)
}

/// Applies attributes/properties/style/class/children onto an already
/// created node, and for component vnodes drives the first update.
pub fn render<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    vnode: &VNode,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    let id = vnode.ref_.get().ok_or(Error::MountShapeMismatch(
        "render called before create".into(),
    ))?;
    match &vnode.kind {
        VNodeKind::Text(_) => {}
        VNodeKind::Element(e) | VNodeKind::Root(e) => {
            render_element(dom, scheduler, id, e, component)?;
        }
        VNodeKind::Component(_) => {
            let _ = component;
            if let Some(handle) = vnode.component() {
                handle.attach();
                handle.update(scheduler)?;
            }
        }
    }
    Ok(())
}

fn render_element<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    id: ElementId,
    e: &ElementData,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    sync_attrs(dom, id, None, e.attrs.as_ref(), true, false)?;
    sync_props(dom, id, None, e.props.as_ref());
    sync_style(dom, id, None, e.style.as_ref());
    sync_classes(dom, id, None, e.classes.as_ref());
    match &e.children {
        Children::Text(text) => dom.set_text(id, text),
        Children::Nodes(nodes) => {
            for (i, child) in nodes.iter().enumerate() {
                let child_id = create(dom, scheduler, child, component)?;
                match &e.container_manager {
                    Some(manager) => children::managed_insert(dom, id, manager, i, child_id),
                    None => dom.append_child(id, child_id),
                }
                render(dom, scheduler, child, component)?;
            }
        }
    }
    Ok(())
}

/// Mutates the live DOM under `old.ref_` to match `new`, transferring
/// `ref_`/`cref` onto `new`. `old` is logically destroyed afterward.
pub fn sync<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    old: &VNode,
    new: &VNode,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    if new.ref_.get().is_some() {
        return Err(Error::VNodeReused);
    }
    if old.is_bind_once() {
        if let Some(id) = old.ref_.get() {
            new.ref_.set(Some(id));
            if let Some(handle) = old.component() {
                new.set_component(handle);
            }
            return Ok(());
        }
    }
    if !compatible(old, new) {
        let parent_id = dom.parent(old.ref_.get().ok_or(Error::MountShapeMismatch(
            "sync called on an uncreated vnode".into(),
        ))?);
        let old_id = old.ref_.get().unwrap();
        let new_id = create(dom, scheduler, new, component)?;
        if let Some(parent_id) = parent_id {
            dom.replace_child(parent_id, old_id, new_id);
        }
        render(dom, scheduler, new, component)?;
        dispose(dom, scheduler, old)?;
        return Ok(());
    }

    let id = old.ref_.get().unwrap();
    new.ref_.set(Some(id));
    if let Some(handle) = old.component() {
        new.set_component(handle);
    }

    match (&old.kind, &new.kind) {
        (VNodeKind::Text(old_text), VNodeKind::Text(new_text)) => {
            if old_text != new_text {
                dom.set_text(id, new_text);
            }
        }
        (VNodeKind::Element(old_e), VNodeKind::Element(new_e))
        | (VNodeKind::Root(old_e), VNodeKind::Root(new_e)) => {
            sync_attrs(
                dom,
                id,
                old_e.attrs.as_ref(),
                new_e.attrs.as_ref(),
                new.flags.contains(crate::vnode::VNodeFlags::DYNAMIC_SHAPE),
                new.is_disable_children_shape_error(),
            )?;
            sync_props(dom, id, old_e.props.as_ref(), new_e.props.as_ref());
            sync_style(dom, id, old_e.style.as_ref(), new_e.style.as_ref());
            sync_classes(dom, id, old_e.classes.as_ref(), new_e.classes.as_ref());
            children::sync_children(
                dom,
                scheduler,
                id,
                &old_e.children,
                &new_e.children,
                new.is_track_by_key(),
                new_e.container_manager.as_ref(),
                component,
            )?;
        }
        (VNodeKind::Component(_old_c), VNodeKind::Component(new_c)) => {
            if let Some(handle) = new.component() {
                let children_box: Option<DataBox> = new_c
                    .children
                    .as_ref()
                    .map(|children| Rc::new((**children).clone()) as DataBox);
                handle.set_data(new_c.data.clone(), scheduler);
                handle.set_children(children_box, scheduler);
                handle.update(scheduler)?;
            }
        }
        _ => unreachable!("compatible() guarantees matching variants"),
    }
    Ok(())
}

/// Binds `vnode` to a pre-existing DOM subtree rooted at `node` without
/// creating any DOM, consuming and discarding comment nodes used as
/// text-node separators. Always runs before the normal sync path for a
/// mounting component.
pub fn mount<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    vnode: &VNode,
    node: ElementId,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    if vnode.ref_.get().is_some() {
        return Err(Error::VNodeReused);
    }
    let node = skip_comment(dom, node);
    vnode.ref_.set(Some(node));

    match &vnode.kind {
        VNodeKind::Text(_) => {}
        VNodeKind::Element(e) | VNodeKind::Root(e) => {
            if !e.tag.is_empty() && !dom.tag_matches(node, &e.tag) {
                return Err(Error::MountShapeMismatch(format!(
                    "expected tag `{}` while mounting",
                    e.tag
                )));
            }
            if let Children::Nodes(nodes) = &e.children {
                let mut cursor = dom.first_child(node);
                for child in nodes {
                    let child_node = cursor.ok_or_else(|| {
                        Error::MountShapeMismatch("ran out of existing children while mounting".into())
                    })?;
                    mount(dom, scheduler, child, child_node, component)?;
                    cursor = dom.next_sibling(child.ref_.get().unwrap());
                }
            }
        }
        VNodeKind::Component(c) => {
            let children_box: Option<DataBox> = c.children.as_ref().map(|children| {
                Rc::new((**children).clone()) as DataBox
            });
            let handle = ComponentHandle::mount(
                scheduler,
                c.descriptor.clone(),
                c.data.clone(),
                children_box,
                parent_for_mount(component),
                node,
            );
            vnode.set_component(handle.clone());
            handle.attach();
            // `is_mounting()` stays true through this first update so the
            // descriptor's `update`/`vRender` path can walk existing DOM
            // instead of rendering fresh.
            handle.update(scheduler)?;
            handle.clear_mounting();
        }
    }
    Ok(())
}

fn parent_for_mount(component: Option<&ComponentHandle>) -> Option<&ComponentHandle> {
    component
}

/// Constructs a root-level component, attaches it, and drives its first
/// update. The descriptor's own `update` callback is responsible for
/// calling `render`/`sync` against whatever `DomApi` backend it closes
/// over.
pub fn inject_component(
    scheduler: &Scheduler,
    descriptor: Rc<ComponentDescriptor>,
    data: DataBox,
    container: ElementId,
) -> Result<ComponentHandle> {
    let handle = ComponentHandle::create(scheduler, descriptor, data, None, None, container);
    handle.attach();
    handle.update(scheduler)?;
    Ok(handle)
}

/// Binds a root-level component onto pre-existing markup, then drives its
/// first update. `is_mounting()` stays set for the descriptor's `update`
/// callback to observe, same as `reconciler::mount`'s component branch.
pub fn mount_component(
    scheduler: &Scheduler,
    descriptor: Rc<ComponentDescriptor>,
    data: DataBox,
    existing_element: ElementId,
) -> Result<ComponentHandle> {
    let handle = ComponentHandle::mount(scheduler, descriptor, data, None, None, existing_element);
    handle.attach();
    handle.update(scheduler)?;
    handle.clear_mounting();
    Ok(handle)
}

/// Walks forward past comment nodes, which mark text-node separators in
/// server-rendered markup.
fn skip_comment<D: DomApi>(dom: &D, mut node: ElementId) -> ElementId {
    while dom.is_comment(node) {
        if let Some(next) = dom.next_sibling(node) {
            node = next;
        } else {
            break;
        }
    }
    node
}

/// Recursively disposes `vnode`: children first, then (unless flagged
/// keep-alive) the component it owns, if any — including that
/// component's own root subtree, disposed in turn before the component
/// itself is torn down.
pub fn dispose<D: DomApi>(dom: &mut D, scheduler: &Scheduler, vnode: &VNode) -> Result<()> {
    match &vnode.kind {
        VNodeKind::Text(_) => {}
        VNodeKind::Element(e) | VNodeKind::Root(e) => {
            if let Children::Nodes(nodes) = &e.children {
                for child in nodes {
                    dispose(dom, scheduler, child)?;
                }
            }
        }
        VNodeKind::Component(_) => {
            debug_invariant!(
                vnode.component().is_some(),
                "component vnode disposed without a bound component"
            );
            if let Some(handle) = vnode.component() {
                if vnode.is_keep_alive() {
                    handle.detach();
                } else {
                    handle.dispose(scheduler, |root| dispose(dom, scheduler, &root))?;
                }
            }
        }
    }
    if let Some(id) = vnode.ref_.get() {
        if let Some(parent) = dom.parent(id) {
            dom.remove_child(parent, id);
        }
    }
    Ok(())
}
