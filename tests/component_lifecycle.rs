//! End-to-end component lifecycle: create/mount, the first update's
//! special-cased root binding, invalidate-driven re-render through the
//! scheduler, and dispose.
//!
//! The glue between a component's `update` descriptor callback and the
//! reconciler (which needs a concrete `DomApi` backend) is left to the
//! descriptor itself, same as a real renderer crate would wire it: the
//! callback closes over the backend and drives `reconciler::mount`/`sync`
//! by hand, following the root-binding rules these tests assert on.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vdom_core::dom::{DomApi, TestDom};
use vdom_core::error::Error;
use vdom_core::prelude::*;
use vdom_core::reconciler;
use vdom_core::vnode::VNode;
use vdom_core::Invalidator;

#[test]
fn first_update_renders_directly_onto_the_component_element() {
    let dom = Rc::new(RefCell::new(TestDom::new()));
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let data: DataBox = Rc::new(Cell::new(0i32));
    let element = dom.borrow_mut().create_placeholder();

    let sched_for_update = scheduler.clone();
    let dom_for_update = dom.clone();
    let descriptor = ComponentDescriptorBuilder::new("counter")
        .update(move |handle: &ComponentHandle| {
            let count = handle
                .data()
                .downcast_ref::<Cell<i32>>()
                .unwrap()
                .get();
            let new_root =
                VNode::create_root().children(vec![VNode::create_text(count.to_string())]);
            let mut dom = dom_for_update.borrow_mut();
            match handle.take_previous_root() {
                None => {
                    new_root.ref_.set(Some(handle.element()));
                    reconciler::render(&mut *dom, &sched_for_update, &new_root, Some(handle))?;
                }
                Some(old_root) => {
                    reconciler::sync(&mut *dom, &sched_for_update, &old_root, &new_root, Some(handle))?;
                }
            }
            handle.set_root(new_root);
            Ok(())
        })
        .build();

    let handle = ComponentHandle::create(&scheduler, descriptor, data.clone(), None, None, element);
    handle.attach();
    handle.update(&scheduler).unwrap();

    let text_id = dom.borrow().children_of(element)[0];
    assert_eq!(dom.borrow().text_of(text_id), Some("0"));

    data.downcast_ref::<Cell<i32>>().unwrap().set(5);
    handle.invalidate(&scheduler);
    assert!(scheduler.run_pending_frame(), "invalidate must schedule a frame");

    assert_eq!(dom.borrow().text_of(text_id), Some("5"), "same text node must be reused across updates");
}

#[test]
fn mount_binds_existing_markup_then_sync_reuses_it() {
    let dom = Rc::new(RefCell::new(TestDom::new()));
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let container = dom.borrow_mut().create_element("div");
    let existing_text = dom.borrow_mut().create_text_node("0");
    dom.borrow_mut().append_child(container, existing_text);

    let data: DataBox = Rc::new(Cell::new(0i32));

    let sched_for_update = scheduler.clone();
    let dom_for_update = dom.clone();
    let descriptor = ComponentDescriptorBuilder::new("counter")
        .update(move |handle: &ComponentHandle| {
            let count = handle
                .data()
                .downcast_ref::<Cell<i32>>()
                .unwrap()
                .get();
            let new_root =
                VNode::create_root().children(vec![VNode::create_text(count.to_string())]);
            let mut dom = dom_for_update.borrow_mut();
            match handle.take_previous_root() {
                None => {
                    reconciler::mount(&mut *dom, &sched_for_update, &new_root, handle.element(), Some(handle))?;
                }
                Some(old_root) => {
                    reconciler::sync(&mut *dom, &sched_for_update, &old_root, &new_root, Some(handle))?;
                }
            }
            handle.set_root(new_root);
            Ok(())
        })
        .build();

    let calls_before = dom.borrow().call_log.len();
    let handle = ComponentHandle::mount(&scheduler, descriptor, data.clone(), None, None, container);
    handle.attach();
    handle.update(&scheduler).unwrap();
    handle.clear_mounting();

    assert!(!handle.is_mounting());
    assert_eq!(dom.borrow().call_log.len(), calls_before, "mounting must not create new DOM nodes");
    assert_eq!(dom.borrow().text_of(existing_text), Some("0"));

    data.downcast_ref::<Cell<i32>>().unwrap().set(7);
    handle.invalidate(&scheduler);
    scheduler.run_pending_frame();

    assert_eq!(
        dom.borrow().text_of(existing_text),
        Some("7"),
        "the text node bound during mount must be the one later updated"
    );
}

#[test]
fn dispose_cancels_subscriptions_and_reclaims_the_scope_id() {
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());
    let data: DataBox = Rc::new(());
    let descriptor = ComponentDescriptorBuilder::new("leaf").build();
    let element = vdom_core::arena::ElementId(0);

    let handle = ComponentHandle::create(&scheduler, descriptor, data, None, None, element);
    let invalidator = Invalidator::shared();
    handle.subscribe(&invalidator);

    handle.dispose(&scheduler, |_root| Ok(())).unwrap();
    assert!(handle.is_disposed());

    // A disposed component's permanent subscription must already be gone;
    // firing the invalidator again must not attempt to invalidate it.
    invalidator.invalidate(&scheduler);
    assert!(
        handle.dispose(&scheduler, |_root| Ok(())).is_err(),
        "disposing twice must fail"
    );
}

#[test]
fn dispose_after_update_removes_the_rendered_root_from_the_dom() {
    let dom = Rc::new(RefCell::new(TestDom::new()));
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let data: DataBox = Rc::new(Cell::new(0i32));
    let container = dom.borrow_mut().create_element("div");
    let element = dom.borrow_mut().create_placeholder();
    dom.borrow_mut().append_child(container, element);

    let sched_for_update = scheduler.clone();
    let dom_for_update = dom.clone();
    let descriptor = ComponentDescriptorBuilder::new("counter")
        .update(move |handle: &ComponentHandle| {
            let count = handle
                .data()
                .downcast_ref::<Cell<i32>>()
                .unwrap()
                .get();
            let new_root =
                VNode::create_root().children(vec![VNode::create_text(count.to_string())]);
            let mut dom = dom_for_update.borrow_mut();
            match handle.take_previous_root() {
                None => {
                    new_root.ref_.set(Some(handle.element()));
                    reconciler::render(&mut *dom, &sched_for_update, &new_root, Some(handle))?;
                }
                Some(old_root) => {
                    reconciler::sync(&mut *dom, &sched_for_update, &old_root, &new_root, Some(handle))?;
                }
            }
            handle.set_root(new_root);
            Ok(())
        })
        .build();

    let handle = ComponentHandle::create(&scheduler, descriptor, data, None, None, element);
    handle.attach();
    handle.update(&scheduler).unwrap();

    let text_id = dom.borrow().children_of(element)[0];
    assert_eq!(dom.borrow().text_of(text_id), Some("0"));
    assert_eq!(dom.borrow().children_of(element).len(), 1, "root text node must be live under the component element");

    let dom_for_dispose = dom.clone();
    let sched_for_dispose = scheduler.clone();
    handle
        .dispose(&scheduler, |root| {
            reconciler::dispose(&mut *dom_for_dispose.borrow_mut(), &sched_for_dispose, &root)
        })
        .unwrap();

    assert!(
        dom.borrow().children_of(element).is_empty(),
        "disposing the component must remove the rendered root's DOM nodes, not leak them"
    );
}

#[test]
fn update_callback_wraps_a_foreign_error_via_error_descriptor() {
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());
    let data: DataBox = Rc::new(());

    let descriptor = ComponentDescriptorBuilder::new("fallible")
        .update(|_handle: &ComponentHandle| {
            "not a number"
                .parse::<i32>()
                .map(|_| ())
                .map_err(Error::descriptor)
        })
        .build();

    let handle = ComponentHandle::create(&scheduler, descriptor, data, None, None, vdom_core::arena::ElementId(0));
    handle.attach();

    let err = handle.update(&scheduler).unwrap_err();
    assert!(matches!(err, Error::Descriptor(_)));
    assert!(err.to_string().contains("component descriptor callback failed"));
}
