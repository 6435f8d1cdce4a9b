//! Child-list diffing: the non-keyed head/tail/residual walk and the
//! keyed algorithm built on longest-increasing-subsequence.
//!
//! The keyed path reduces by prefix/suffix/swap matching first, then
//! hands whatever remains to an LIS-based middle phase using the
//! `longest_increasing_subsequence` crate. The LIS input excludes
//! sentinel ("insert") positions before the crate call, since those can
//! never legally extend an increasing run.

use std::rc::Rc;

use fxhash::{FxHashMap, FxHashSet};

use crate::arena::ElementId;
use crate::component::ComponentHandle;
use crate::debug_invariant;
use crate::dom::DomApi;
use crate::error::{Error, Result};
use crate::scheduler::Scheduler;
use crate::vnode::{Children, ContainerManager, Key, VNode};

use super::{compatible, create, dispose, render, sync};

pub fn sync_children<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    old: &Children,
    new: &Children,
    track_by_key: bool,
    manager: Option<&Rc<ContainerManager>>,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    match (old, new) {
        (Children::Text(old_text), Children::Text(new_text)) => {
            if old_text != new_text {
                dom.set_text(parent, new_text);
            }
            Ok(())
        }
        (Children::Text(_), Children::Nodes(new_nodes)) => {
            dom.set_text(parent, "");
            for child in new_nodes {
                create_and_insert(dom, scheduler, parent, child, None, component)?;
            }
            Ok(())
        }
        (Children::Nodes(old_nodes), Children::Text(new_text)) => {
            for child in old_nodes {
                dispose(dom, scheduler, child)?;
            }
            dom.set_text(parent, new_text);
            Ok(())
        }
        (Children::Nodes(old_nodes), Children::Nodes(new_nodes)) => {
            if let Some(manager) = manager {
                return sync_children_managed(
                    dom, scheduler, parent, manager, old_nodes, new_nodes, track_by_key, component,
                );
            }
            if old_nodes.is_empty() && new_nodes.is_empty() {
                return Ok(());
            }
            if old_nodes.is_empty() {
                for child in new_nodes {
                    create_and_insert(dom, scheduler, parent, child, None, component)?;
                }
                return Ok(());
            }
            if new_nodes.is_empty() {
                for child in old_nodes {
                    dispose(dom, scheduler, child)?;
                }
                return Ok(());
            }
            if track_by_key {
                sync_keyed(dom, scheduler, parent, old_nodes, new_nodes, component)
            } else {
                sync_non_keyed(dom, scheduler, parent, old_nodes, new_nodes, component)
            }
        }
    }
}

/// Calls `manager.insert_child` if provided, otherwise falls back to
/// `dom.append_child` and logs the fallback.
pub(crate) fn managed_insert<D: DomApi>(
    dom: &mut D,
    parent: ElementId,
    manager: &ContainerManager,
    index: usize,
    child: ElementId,
) {
    match manager.insert_child.as_ref() {
        Some(hook) => hook(index, child),
        None => {
            log::warn!("container manager has no insert_child hook; falling back to append_child");
            dom.append_child(parent, child);
        }
    }
}

fn managed_remove<D: DomApi>(
    dom: &mut D,
    parent: ElementId,
    manager: &ContainerManager,
    index: usize,
    child: ElementId,
) {
    match manager.remove_child.as_ref() {
        Some(hook) => hook(index, child),
        None => {
            log::warn!("container manager has no remove_child hook; falling back to remove_child");
            dom.remove_child(parent, child);
        }
    }
}

fn managed_replace<D: DomApi>(
    dom: &mut D,
    parent: ElementId,
    manager: &ContainerManager,
    index: usize,
    old: ElementId,
    new: ElementId,
) {
    match manager.replace_child.as_ref() {
        Some(hook) => hook(index, old, new),
        None => {
            log::warn!("container manager has no replace_child hook; falling back to replace_child");
            dom.replace_child(parent, old, new);
        }
    }
}

/// When the element carries a container manager, the default append/
/// insert/remove/replace DOM calls are replaced by calls through the
/// manager's hooks (each falling back to the default op if unset); node
/// lifecycle (`create`/`dispose`/`sync`) is unaffected. Positions are
/// matched by index rather than the full prefix/suffix/LIS machinery: a
/// managed container owns its own placement strategy, so the
/// reconciler's job is reduced to feeding it create/dispose/replace
/// instructions. `move_child` has no call site here since this
/// positional walk never needs to reorder an already-placed child.
fn sync_children_managed<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    manager: &ContainerManager,
    old: &[VNode],
    new: &[VNode],
    track_by_key: bool,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    if track_by_key && (old.iter().any(|n| n.key.is_none()) || new.iter().any(|n| n.key.is_none())) {
        return Err(Error::MissingKey);
    }

    let min_len = old.len().min(new.len());
    for i in 0..min_len {
        if compatible(&old[i], &new[i]) {
            sync(dom, scheduler, &old[i], &new[i], component)?;
        } else {
            let old_id = old[i].ref_.get().unwrap();
            dispose(dom, scheduler, &old[i])?;
            let new_id = create(dom, scheduler, &new[i], component)?;
            managed_replace(dom, parent, manager, i, old_id, new_id);
            render(dom, scheduler, &new[i], component)?;
        }
    }
    if new.len() > min_len {
        for i in min_len..new.len() {
            let new_id = create(dom, scheduler, &new[i], component)?;
            managed_insert(dom, parent, manager, i, new_id);
            render(dom, scheduler, &new[i], component)?;
        }
    } else if old.len() > min_len {
        for i in (min_len..old.len()).rev() {
            let old_id = old[i].ref_.get().unwrap();
            managed_remove(dom, parent, manager, i, old_id);
            dispose(dom, scheduler, &old[i])?;
        }
    }
    Ok(())
}

fn relocate<D: DomApi>(dom: &mut D, parent: ElementId, child: ElementId, anchor: Option<ElementId>) {
    match anchor {
        Some(anchor) => dom.insert_before(parent, child, anchor),
        None => dom.append_child(parent, child),
    }
}

fn create_and_insert<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    vnode: &VNode,
    anchor: Option<ElementId>,
    component: Option<&ComponentHandle>,
) -> Result<()> {
    let id = create(dom, scheduler, vnode, component)?;
    relocate(dom, parent, id, anchor);
    render(dom, scheduler, vnode, component)?;
    Ok(())
}

fn has_mixed_keys(nodes: &[VNode]) -> bool {
    let mut saw_keyed = false;
    let mut saw_unkeyed = false;
    for n in nodes {
        if n.key.is_some() {
            saw_keyed = true;
        } else {
            saw_unkeyed = true;
        }
    }
    saw_keyed && saw_unkeyed
}

/// Head/tail walk, then a residual-middle pass that syncs aligned
/// positions, then trailing inserts/removals.
fn sync_non_keyed<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    old: &[VNode],
    new: &[VNode],
    component: Option<&ComponentHandle>,
) -> Result<()> {
    if has_mixed_keys(old) || has_mixed_keys(new) {
        return Err(Error::MixedKeyedSiblings);
    }

    let min_len = old.len().min(new.len());

    let mut head = 0;
    while head < min_len && compatible(&old[head], &new[head]) {
        sync(dom, scheduler, &old[head], &new[head], component)?;
        head += 1;
    }

    let mut tail = 0;
    while tail < min_len - head
        && compatible(&old[old.len() - 1 - tail], &new[new.len() - 1 - tail])
    {
        sync(
            dom,
            scheduler,
            &old[old.len() - 1 - tail],
            &new[new.len() - 1 - tail],
            component,
        )?;
        tail += 1;
    }

    let old_mid = &old[head..old.len() - tail];
    let new_mid = &new[head..new.len() - tail];
    let aligned = old_mid.len().min(new_mid.len());

    for j in 0..aligned {
        sync(dom, scheduler, &old_mid[j], &new_mid[j], component)?;
    }

    let anchor = if tail > 0 {
        Some(new[new.len() - tail].ref_.get().unwrap())
    } else {
        None
    };

    if new_mid.len() > aligned {
        for j in aligned..new_mid.len() {
            create_and_insert(dom, scheduler, parent, &new_mid[j], anchor, component)?;
        }
    } else if old_mid.len() > aligned {
        for j in aligned..old_mid.len() {
            dispose(dom, scheduler, &old_mid[j])?;
        }
    }

    Ok(())
}

fn has_duplicate_keys(nodes: &[VNode]) -> bool {
    let mut seen: FxHashSet<&Key> = FxHashSet::default();
    for n in nodes {
        if let Some(k) = n.key.as_ref() {
            if !seen.insert(k) {
                return true;
            }
        }
    }
    false
}

/// The keyed-children algorithm. Phase 1 reduces by simple
/// prefix/suffix/swap moves; phase 2 handles whatever remains via an
/// LIS-based minimal-move reordering.
fn sync_keyed<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    old: &[VNode],
    new: &[VNode],
    component: Option<&ComponentHandle>,
) -> Result<()> {
    if old.iter().any(|n| n.key.is_none()) || new.iter().any(|n| n.key.is_none()) {
        return Err(Error::MissingKey);
    }
    debug_invariant!(!has_duplicate_keys(old), "duplicate key among old keyed siblings");
    debug_invariant!(!has_duplicate_keys(new), "duplicate key among new keyed siblings");

    let mut a_start = 0usize;
    let mut a_end = old.len();
    let mut b_start = 0usize;
    let mut b_end = new.len();

    while a_start < a_end && b_start < b_end {
        if old[a_start].key == new[b_start].key {
            sync(dom, scheduler, &old[a_start], &new[b_start], component)?;
            a_start += 1;
            b_start += 1;
            continue;
        }
        if old[a_end - 1].key == new[b_end - 1].key {
            sync(dom, scheduler, &old[a_end - 1], &new[b_end - 1], component)?;
            a_end -= 1;
            b_end -= 1;
            continue;
        }
        if old[a_start].key == new[b_end - 1].key {
            sync(dom, scheduler, &old[a_start], &new[b_end - 1], component)?;
            let old_end_id = old[a_end - 1].ref_.get().unwrap();
            let anchor = dom.next_sibling(old_end_id);
            let moved_id = new[b_end - 1].ref_.get().unwrap();
            relocate(dom, parent, moved_id, anchor);
            a_start += 1;
            b_end -= 1;
            continue;
        }
        if old[a_end - 1].key == new[b_start].key {
            sync(dom, scheduler, &old[a_end - 1], &new[b_start], component)?;
            let anchor = Some(old[a_start].ref_.get().unwrap());
            let moved_id = new[b_start].ref_.get().unwrap();
            relocate(dom, parent, moved_id, anchor);
            a_end -= 1;
            b_start += 1;
            continue;
        }
        break;
    }

    if a_start == a_end && b_start == b_end {
        return Ok(());
    }

    let boundary_anchor = if b_end < new.len() {
        Some(new[b_end].ref_.get().unwrap())
    } else {
        None
    };

    if a_start == a_end {
        let mut anchor = boundary_anchor;
        for j in (b_start..b_end).rev() {
            create_and_insert(dom, scheduler, parent, &new[j], anchor, component)?;
            anchor = Some(new[j].ref_.get().unwrap());
        }
        return Ok(());
    }

    if b_start == b_end {
        for j in a_start..a_end {
            dispose(dom, scheduler, &old[j])?;
        }
        return Ok(());
    }

    sync_keyed_middle(
        dom,
        scheduler,
        parent,
        &old[a_start..a_end],
        &new[b_start..b_end],
        component,
        boundary_anchor,
    )
}

/// Assigns `sources[newPos] = oldPos` (or the sentinel for inserts),
/// computes the LIS of the matched positions, then walks right to left
/// placing inserts/moves and chaining the anchor onto whatever was just
/// placed.
fn sync_keyed_middle<D: DomApi>(
    dom: &mut D,
    scheduler: &Scheduler,
    parent: ElementId,
    old_mid: &[VNode],
    new_mid: &[VNode],
    component: Option<&ComponentHandle>,
    boundary_anchor: Option<ElementId>,
) -> Result<()> {
    const INSERT: usize = usize::MAX;
    let b_len = new_mid.len();
    let mut sources = vec![INSERT; b_len];

    let use_map = old_mid.len().saturating_mul(new_mid.len()) > 16;
    let mut new_key_to_index: FxHashMap<&Key, usize> = FxHashMap::default();
    if use_map {
        for (i, n) in new_mid.iter().enumerate() {
            new_key_to_index.insert(n.key.as_ref().unwrap(), i);
        }
    }
    let find_new_index = |key: &Key| -> Option<usize> {
        if use_map {
            new_key_to_index.get(key).copied()
        } else {
            new_mid.iter().position(|n| n.key.as_ref() == Some(key))
        }
    };

    let mut moved = false;
    let mut last_target = 0usize;
    for (old_pos, old_node) in old_mid.iter().enumerate() {
        let key = old_node.key.as_ref().unwrap();
        match find_new_index(key) {
            Some(new_pos) => {
                sources[new_pos] = old_pos;
                sync(dom, scheduler, old_node, &new_mid[new_pos], component)?;
                if new_pos < last_target {
                    moved = true;
                } else {
                    last_target = new_pos;
                }
            }
            None => dispose(dom, scheduler, old_node)?,
        }
    }

    let in_lis: FxHashSet<usize> = if moved {
        let mut present_indices = Vec::new();
        let mut present_values = Vec::new();
        for (i, &v) in sources.iter().enumerate() {
            if v != INSERT {
                present_indices.push(i);
                present_values.push(v);
            }
        }
        let mut result = FxHashSet::default();
        if !present_values.is_empty() {
            let mut local_in_lis = FxHashSet::default();
            let mut predecessors = vec![0usize; present_values.len()];
            let mut starts = vec![0usize; present_values.len()];
            longest_increasing_subsequence::lis_with(
                &present_values,
                &mut local_in_lis,
                |a, b| a < b,
                &mut predecessors,
                &mut starts,
            );
            for local_idx in local_in_lis {
                result.insert(present_indices[local_idx]);
            }
        }
        result
    } else {
        (0..sources.len()).filter(|&i| sources[i] != INSERT).collect()
    };

    let mut anchor = boundary_anchor;
    for i in (0..b_len).rev() {
        if sources[i] == INSERT {
            create_and_insert(dom, scheduler, parent, &new_mid[i], anchor, component)?;
        } else if !in_lis.contains(&i) {
            let moved_id = new_mid[i].ref_.get().unwrap();
            relocate(dom, parent, moved_id, anchor);
        }
        anchor = Some(new_mid[i].ref_.get().unwrap());
    }

    Ok(())
}
