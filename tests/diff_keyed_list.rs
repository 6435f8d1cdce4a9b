//! Keyed child-list diffing: prefix/suffix/swap reduction plus the
//! LIS-based middle phase.

use vdom_core::dom::TestDom;
use vdom_core::prelude::*;
use vdom_core::reconciler;
use vdom_core::vnode::VNode;

fn keyed_list(keys: &[u64]) -> VNode {
    let children = keys
        .iter()
        .map(|k| VNode::create_text(k.to_string()).key(*k))
        .collect();
    VNode::create_element("ul")
        .track_by_key_children()
        .children(children)
}

fn rendered_order(dom: &TestDom, container: vdom_core::arena::ElementId) -> Vec<String> {
    dom.children_of(container)
        .iter()
        .map(|id| dom.text_of(*id).unwrap().to_string())
        .collect()
}

fn diff(old_keys: &[u64], new_keys: &[u64]) -> (TestDom, Vec<String>) {
    let mut dom = TestDom::new();
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let old = keyed_list(old_keys);
    let id = reconciler::create(&mut dom, &scheduler, &old, None).unwrap();
    reconciler::render(&mut dom, &scheduler, &old, None).unwrap();

    let new = keyed_list(new_keys);
    reconciler::sync(&mut dom, &scheduler, &old, &new, None).unwrap();

    assert_eq!(new.ref_.get(), Some(id));
    let order = rendered_order(&dom, id);
    (dom, order)
}

#[test]
fn minimal_moves_with_inserts_and_deletes() {
    // The scenario this crate's keyed middle phase was grounded on:
    // 7 and 8 are dropped, 0..=5 reverse, 9 stays pinned at the tail.
    let (_dom, order) = diff(&[7, 0, 1, 8, 2, 3, 4, 5, 9], &[5, 4, 3, 2, 1, 0, 9]);
    assert_eq!(order, ["5", "4", "3", "2", "1", "0", "9"]);
}

#[test]
fn prefix_reduction_handles_pure_append() {
    let (dom, order) = diff(&[1, 2, 3], &[1, 2, 3, 4]);
    assert_eq!(order, ["1", "2", "3", "4"]);
    // Only the new tail element should have triggered a creation call.
    assert_eq!(
        dom.call_log.iter().filter(|l| l.starts_with("create_text_node")).count(),
        4
    );
}

#[test]
fn suffix_reduction_handles_pure_prepend() {
    let (_dom, order) = diff(&[2, 3, 4], &[1, 2, 3, 4]);
    assert_eq!(order, ["1", "2", "3", "4"]);
}

#[test]
fn cross_match_moves_tail_to_front() {
    let (_dom, order) = diff(&[1, 2, 3], &[3, 1, 2]);
    assert_eq!(order, ["3", "1", "2"]);
}

#[test]
fn cross_match_moves_head_to_back() {
    let (_dom, order) = diff(&[1, 2, 3], &[2, 3, 1]);
    assert_eq!(order, ["2", "3", "1"]);
}

#[test]
fn full_replacement_disposes_and_recreates() {
    let (dom, order) = diff(&[1, 2, 3], &[4, 5, 6]);
    assert_eq!(order, ["4", "5", "6"]);
    assert_eq!(dom.call_log.iter().filter(|l| l.starts_with("remove_child")).count(), 3);
}

#[test]
fn missing_key_is_rejected() {
    let mut dom = TestDom::new();
    let scheduler = Scheduler::with_manual_tick(SchedulerConfig::default());

    let old = keyed_list(&[1, 2]);
    reconciler::create(&mut dom, &scheduler, &old, None).unwrap();
    reconciler::render(&mut dom, &scheduler, &old, None).unwrap();

    let new = VNode::create_element("ul")
        .track_by_key_children()
        .children(vec![VNode::create_text("1").key(1u64), VNode::create_text("2")]);

    let err = reconciler::sync(&mut dom, &scheduler, &old, &new, None).unwrap_err();
    assert!(matches!(err, Error::MissingKey));
}
