//! Attribute, property, style, and class representations plus the
//! static/dynamic-shape sync algorithm.

use fxhash::FxHashMap;

use crate::arena::ElementId;
use crate::dom::DomApi;
use crate::error::{Error, Result};

pub type AttrMap = FxHashMap<String, String>;
pub type PropMap = FxHashMap<String, String>;

#[derive(Debug, Clone)]
pub enum StyleValue {
    /// Assigned wholesale via `style.cssText`.
    Text(String),
    /// Assigned per-property.
    Map(FxHashMap<String, String>),
}

#[derive(Debug, Clone)]
pub enum ClassValue {
    Name(String),
    List(Vec<String>),
}

/// Attribute names beginning with `$` are namespaced; the prefix up to the
/// first `:` after the sentinel selects one of these fixed entries.
const NAMESPACE_TABLE: &[(&str, &str, &str)] = &[
    ("$xlink:actuate", "xlink:actuate", "http://www.w3.org/1999/xlink"),
    ("$xlink:arcrole", "xlink:arcrole", "http://www.w3.org/1999/xlink"),
    ("$xlink:href", "xlink:href", "http://www.w3.org/1999/xlink"),
    ("$xlink:role", "xlink:role", "http://www.w3.org/1999/xlink"),
    ("$xlink:show", "xlink:show", "http://www.w3.org/1999/xlink"),
    ("$xlink:title", "xlink:title", "http://www.w3.org/1999/xlink"),
    ("$xlink:type", "xlink:type", "http://www.w3.org/1999/xlink"),
    ("$xml:base", "xml:base", "http://www.w3.org/XML/1998/namespace"),
    ("$xml:lang", "xml:lang", "http://www.w3.org/XML/1998/namespace"),
    ("$xml:space", "xml:space", "http://www.w3.org/XML/1998/namespace"),
];

/// Resolves a possibly-`$`-prefixed attribute name to the bare name plus an
/// optional namespace URI. Returns `Err` if the name carries the sentinel
/// but doesn't match a known entry.
pub fn resolve_namespace(name: &str) -> Result<(&str, Option<&'static str>)> {
    if !name.starts_with('$') {
        return Ok((name, None));
    }
    for (full, bare, ns) in NAMESPACE_TABLE {
        if *full == name {
            return Ok((bare, Some(ns)));
        }
    }
    Err(Error::UnknownNamespacedAttribute(name.to_string()))
}

/// Syncs an attribute or property map. `dynamic_shape` selects the
/// algorithm: static shape requires identical key sets and only walks
/// `old`; dynamic shape walks both sides to handle key churn.
/// `disable_shape_error` suppresses the static-shape key-set mismatch
/// check (`VNode::disable_children_shape_error`); it has no effect under
/// `dynamic_shape`, which never performs that check.
pub fn sync_attrs<D: DomApi>(
    dom: &mut D,
    node: ElementId,
    old: Option<&AttrMap>,
    new: Option<&AttrMap>,
    dynamic_shape: bool,
    disable_shape_error: bool,
) -> Result<()> {
    match (old, new) {
        (None, None) => Ok(()),
        (None, Some(new)) => {
            for (k, v) in new {
                let (bare, ns) = resolve_namespace(k)?;
                dom.set_attribute(node, bare, v, ns);
            }
            Ok(())
        }
        (Some(old), None) => {
            for k in old.keys() {
                let (bare, ns) = resolve_namespace(k)?;
                dom.remove_attribute(node, bare, ns);
            }
            Ok(())
        }
        (Some(old), Some(new)) => {
            if dynamic_shape {
                sync_dynamic_shape(dom, node, old, new)
            } else {
                sync_static_shape(dom, node, old, new, disable_shape_error)
            }
        }
    }
}

fn sync_static_shape<D: DomApi>(
    dom: &mut D,
    node: ElementId,
    old: &AttrMap,
    new: &AttrMap,
    disable_shape_error: bool,
) -> Result<()> {
    if cfg!(debug_assertions) && !disable_shape_error {
        let old_only: Vec<String> = old.keys().filter(|k| !new.contains_key(*k)).cloned().collect();
        let new_only: Vec<String> = new.keys().filter(|k| !old.contains_key(*k)).cloned().collect();
        if !old_only.is_empty() || !new_only.is_empty() {
            return Err(Error::StaticShapeMismatch { old_only, new_only });
        }
    }
    for (k, old_v) in old {
        if let Some(new_v) = new.get(k) {
            if old_v != new_v {
                let (bare, ns) = resolve_namespace(k)?;
                dom.set_attribute(node, bare, new_v, ns);
            }
        }
    }
    Ok(())
}

fn sync_dynamic_shape<D: DomApi>(
    dom: &mut D,
    node: ElementId,
    old: &AttrMap,
    new: &AttrMap,
) -> Result<()> {
    for k in old.keys() {
        if !new.contains_key(k) {
            let (bare, ns) = resolve_namespace(k)?;
            dom.remove_attribute(node, bare, ns);
        }
    }
    for (k, new_v) in new {
        match old.get(k) {
            Some(old_v) if old_v == new_v => {}
            _ => {
                let (bare, ns) = resolve_namespace(k)?;
                dom.set_attribute(node, bare, new_v, ns);
            }
        }
    }
    Ok(())
}

pub fn sync_props<D: DomApi>(dom: &mut D, node: ElementId, old: Option<&PropMap>, new: Option<&PropMap>) {
    match (old, new) {
        (None, None) => {}
        (_, Some(new)) => {
            for (k, v) in new {
                if old.and_then(|o| o.get(k)) != Some(v) {
                    dom.set_property(node, k, v);
                }
            }
        }
        (Some(_), None) => {}
    }
}

pub fn sync_style<D: DomApi>(dom: &mut D, node: ElementId, old: Option<&StyleValue>, new: Option<&StyleValue>) {
    match (old, new) {
        (None, None) => {}
        (_, Some(StyleValue::Text(text))) => {
            dom.set_style_text(node, text);
        }
        (Some(StyleValue::Map(old_map)), Some(StyleValue::Map(new_map))) => {
            for k in old_map.keys() {
                if !new_map.contains_key(k) {
                    dom.remove_style_property(node, k);
                }
            }
            for (k, v) in new_map {
                if old_map.get(k) != Some(v) {
                    dom.set_style_property(node, k, v);
                }
            }
        }
        (_, Some(StyleValue::Map(new_map))) => {
            for (k, v) in new_map {
                dom.set_style_property(node, k, v);
            }
        }
        (Some(_), None) => {
            dom.set_style_text(node, "");
        }
    }
}

/// O(n+m) class-list diff with fast paths for the common small cases
/// before falling back to pairwise comparison.
pub fn sync_classes<D: DomApi>(dom: &mut D, node: ElementId, old: Option<&ClassValue>, new: Option<&ClassValue>) {
    let new_name = match new {
        None => String::new(),
        Some(ClassValue::Name(n)) => n.clone(),
        Some(ClassValue::List(list)) => {
            if let Some(ClassValue::List(old_list)) = old {
                if fast_path_equal(old_list, list) {
                    return;
                }
            }
            list.join(" ")
        }
    };
    let old_name = match old {
        None => String::new(),
        Some(ClassValue::Name(n)) => n.clone(),
        Some(ClassValue::List(list)) => list.join(" "),
    };
    if old_name != new_name {
        dom.set_class_name(node, &new_name);
    }
}

fn fast_path_equal(a: &[String], b: &[String]) -> bool {
    if a.len() == 1 && b.len() == 1 {
        return a[0] == b[0];
    }
    if a.len() != b.len() {
        return false;
    }
    let mut head = 0;
    while head < a.len() && a[head] == b[head] {
        head += 1;
    }
    if head == a.len() {
        return true;
    }
    let mut tail = 0;
    while tail < a.len() - head && a[a.len() - 1 - tail] == b[b.len() - 1 - tail] {
        tail += 1;
    }
    a[head..a.len() - tail] == b[head..b.len() - tail]
}
