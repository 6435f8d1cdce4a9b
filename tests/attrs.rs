//! Attribute/style/class sync: static-shape key-set enforcement, dynamic
//! shape churn, style map diffing, and the class fast paths.

use vdom_core::dom::{DomApi, TestDom};
use vdom_core::error::Error;
use vdom_core::vnode::attrs::{resolve_namespace, sync_attrs, sync_classes, sync_style, AttrMap, ClassValue, StyleValue};

fn attrs(pairs: &[(&str, &str)]) -> AttrMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn static_shape_updates_changed_values_only() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = attrs(&[("id", "a"), ("title", "x")]);
    let new = attrs(&[("id", "a"), ("title", "y")]);
    sync_attrs(&mut dom, node, Some(&old), Some(&new), false, false).unwrap();

    assert_eq!(dom.attr(node, "title"), Some("y"));
    assert_eq!(
        dom.call_log.iter().filter(|l| l.starts_with("set_attribute")).count(),
        1,
        "only the changed key should trigger a DOM write"
    );
}

#[test]
fn static_shape_rejects_key_set_mismatch_in_debug() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = attrs(&[("id", "a")]);
    let new = attrs(&[("id", "a"), ("title", "y")]);
    let result = sync_attrs(&mut dom, node, Some(&old), Some(&new), false, false);

    if cfg!(debug_assertions) {
        let err = result.unwrap_err();
        assert!(matches!(err, Error::StaticShapeMismatch { .. }));
    } else {
        result.unwrap();
    }
}

#[test]
fn static_shape_mismatch_suppressed_when_shape_errors_are_disabled() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = attrs(&[("id", "a")]);
    let new = attrs(&[("id", "a"), ("title", "y")]);
    sync_attrs(&mut dom, node, Some(&old), Some(&new), false, true).unwrap();

    assert_eq!(dom.attr(node, "id"), Some("a"));
}

#[test]
fn dynamic_shape_handles_key_churn() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = attrs(&[("id", "a"), ("title", "x")]);
    let new = attrs(&[("id", "a"), ("data-new", "z")]);
    sync_attrs(&mut dom, node, Some(&old), Some(&new), true, false).unwrap();

    assert_eq!(dom.attr(node, "data-new"), Some("z"));
    assert!(
        dom.call_log.iter().any(|l| l.starts_with("remove_attribute") && l.contains("title")),
        "a key dropped on the new side must be removed"
    );
    assert!(
        !dom.call_log.iter().any(|l| l.starts_with("set_attribute") && l.contains("id=")),
        "an unchanged key must not be rewritten"
    );
}

#[test]
fn namespaced_attribute_resolves_to_xlink() {
    let (bare, ns) = resolve_namespace("$xlink:href").unwrap();
    assert_eq!(bare, "xlink:href");
    assert_eq!(ns, Some("http://www.w3.org/1999/xlink"));
}

#[test]
fn unknown_namespaced_attribute_is_rejected() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");
    let new = attrs(&[("$bogus:thing", "x")]);
    let err = sync_attrs(&mut dom, node, None, Some(&new), false, false).unwrap_err();
    assert!(matches!(err, Error::UnknownNamespacedAttribute(_)));
}

#[test]
fn style_map_diff_adds_removes_and_updates_properties() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = StyleValue::Map(
        [("color".to_string(), "red".to_string()), ("width".to_string(), "1px".to_string())]
            .into_iter()
            .collect(),
    );
    let new = StyleValue::Map(
        [("color".to_string(), "blue".to_string()), ("height".to_string(), "2px".to_string())]
            .into_iter()
            .collect(),
    );
    sync_style(&mut dom, node, Some(&old), Some(&new));

    assert_eq!(dom.style_prop(node, "color"), Some("blue"));
    assert_eq!(dom.style_prop(node, "height"), Some("2px"));
    assert!(dom.call_log.iter().any(|l| l.starts_with("remove_style_property") && l.contains("width")));
}

#[test]
fn style_text_replaces_a_prior_map_wholesale() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = StyleValue::Map([("color".to_string(), "red".to_string())].into_iter().collect());
    let new = StyleValue::Text("color: blue;".to_string());
    sync_style(&mut dom, node, Some(&old), Some(&new));

    assert!(dom.call_log.iter().any(|l| l == "set_style_text 0 color: blue;"));
}

#[test]
fn class_list_fast_path_detects_head_tail_shared_run() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = ClassValue::List(vec!["a".into(), "b".into(), "c".into()]);
    let new = ClassValue::List(vec!["a".into(), "x".into(), "c".into()]);
    sync_classes(&mut dom, node, Some(&old), Some(&new));

    assert_eq!(dom.class_name(node), "a x c");
}

#[test]
fn class_list_unchanged_skips_the_dom_write() {
    let mut dom = TestDom::new();
    let node = dom.create_element("div");

    let old = ClassValue::List(vec!["a".into(), "b".into()]);
    let new = ClassValue::List(vec!["a".into(), "b".into()]);
    sync_classes(&mut dom, node, Some(&old), Some(&new));

    assert!(!dom.call_log.iter().any(|l| l.starts_with("set_class_name")));
}
