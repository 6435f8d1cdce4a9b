//! Bind-once's terminal-subtree short-circuit, a container manager
//! overriding the default child-list DOM operations, and the
//! `inject_component`/`mount_component` entry points.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vdom_core::arena::ElementId;
use vdom_core::dom::{DomApi, TestDom};
use vdom_core::prelude::*;
use vdom_core::reconciler;
use vdom_core::vnode::{ContainerManager, VNode};

#[test]
fn bind_once_short_circuits_sync_without_touching_dom() {
    let mut dom = TestDom::new();
    let id = dom.create_element("div");
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let old = VNode::create_element("div").bind_once();
    old.ref_.set(Some(id));

    // Deliberately incompatible (different tag): without the bind-once
    // short-circuit this would force a create+replace+dispose cycle.
    let new = VNode::create_element("span");

    let calls_before = dom.call_log.len();
    reconciler::sync(&mut dom, &scheduler, &old, &new, None).unwrap();

    assert_eq!(new.ref_.get(), Some(id), "bind-once must carry the existing ref onto the new node");
    assert_eq!(dom.call_log.len(), calls_before, "bind-once must not touch the DOM at all");
}

fn recording_manager(log: Rc<RefCell<Vec<String>>>) -> ContainerManager {
    let insert_log = log.clone();
    let replace_log = log.clone();
    ContainerManager {
        insert_child: Some(Box::new(move |index, child| {
            insert_log.borrow_mut().push(format!("insert {index} {}", child.0));
        })),
        replace_child: Some(Box::new(move |index, old, new| {
            replace_log.borrow_mut().push(format!("replace {index} {} {}", old.0, new.0));
        })),
        remove_child: None,
        move_child: None,
    }
}

#[test]
fn managed_container_delegates_initial_children_to_the_manager() {
    let mut dom = TestDom::new();
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let log = Rc::new(RefCell::new(Vec::new()));
    let manager = Rc::new(recording_manager(log.clone()));
    let root = VNode::create_element("ul")
        .managed_container(manager)
        .children(vec![VNode::create_element("li"), VNode::create_element("li")]);

    let id = reconciler::create(&mut dom, &scheduler, &root, None).unwrap();
    reconciler::render(&mut dom, &scheduler, &root, None).unwrap();

    assert_eq!(log.borrow().len(), 2, "both initial children must go through the manager");
    assert!(log.borrow()[0].starts_with("insert 0"));
    assert!(log.borrow()[1].starts_with("insert 1"));
    assert!(
        !dom.call_log.iter().any(|l| l.starts_with("append_child") || l.starts_with("insert_before")),
        "the reconciler must not append/insert the managed children itself"
    );
    let _ = id;
}

#[test]
fn managed_container_delegates_sync_replace_insert_remove() {
    let mut dom = TestDom::new();
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let log = Rc::new(RefCell::new(Vec::new()));
    let manager = Rc::new(recording_manager(log.clone()));
    let old_root = VNode::create_element("ul").managed_container(manager.clone()).children(vec![
        VNode::create_element("li"),
        VNode::create_element("span"),
    ]);
    reconciler::create(&mut dom, &scheduler, &old_root, None).unwrap();
    reconciler::render(&mut dom, &scheduler, &old_root, None).unwrap();
    log.borrow_mut().clear();

    let new_root = VNode::create_element("ul").managed_container(manager).children(vec![
        VNode::create_element("li"),
        VNode::create_element("b"),
        VNode::create_element("li"),
    ]);

    reconciler::sync(&mut dom, &scheduler, &old_root, &new_root, None).unwrap();

    assert!(
        log.borrow().iter().any(|l| l.starts_with("replace 1")),
        "an incompatible position must go through replace_child: {:?}",
        log.borrow()
    );
    assert!(
        log.borrow().iter().any(|l| l.starts_with("insert 2")),
        "a trailing surplus child must go through insert_child: {:?}",
        log.borrow()
    );
}

#[test]
fn managed_container_falls_back_to_dom_ops_when_a_hook_is_missing() {
    let mut dom = TestDom::new();
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    // No hooks at all: every operation must fall back to the default
    // DomApi call instead of silently doing nothing.
    let manager = Rc::new(ContainerManager::default());
    let root = VNode::create_element("ul")
        .managed_container(manager)
        .children(vec![VNode::create_element("li")]);

    reconciler::create(&mut dom, &scheduler, &root, None).unwrap();
    reconciler::render(&mut dom, &scheduler, &root, None).unwrap();

    assert!(
        dom.call_log.iter().any(|l| l.starts_with("append_child")),
        "a manager with no insert_child hook must still append the child to the real DOM"
    );
}

#[test]
fn inject_component_constructs_attaches_and_runs_the_first_update() {
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());
    let ran = Rc::new(Cell::new(false));
    let ran_for_update = ran.clone();

    let descriptor = ComponentDescriptorBuilder::new("widget")
        .update(move |handle: &ComponentHandle| {
            assert!(handle.is_attached(), "inject_component must attach before the first update");
            ran_for_update.set(true);
            Ok(())
        })
        .build();

    let data: DataBox = Rc::new(());
    let handle = reconciler::inject_component(&scheduler, descriptor, data, ElementId(0)).unwrap();

    assert!(ran.get());
    assert!(!handle.is_dirty(), "the first update must clear the dirty flag");
}

#[test]
fn mount_component_binds_then_updates_with_mounting_cleared_after() {
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());
    let observed_mounting = Rc::new(Cell::new(false));
    let observed_for_update = observed_mounting.clone();

    let descriptor = ComponentDescriptorBuilder::new("widget")
        .update(move |handle: &ComponentHandle| {
            observed_for_update.set(handle.is_mounting());
            Ok(())
        })
        .build();

    let data: DataBox = Rc::new(());
    let handle = reconciler::mount_component(&scheduler, descriptor, data, ElementId(0)).unwrap();

    assert!(observed_mounting.get(), "the update callback must see is_mounting() true while binding");
    assert!(!handle.is_mounting(), "mounting must be cleared once the first update returns");
}
