//! Chain compactor (C8).
//!
//! Runs under the chain writer lock, exclusive of every reader and
//! accessor. Collapses parent nodes that have exactly one child into that
//! child, bounding how far a recursive segment lookup has to walk.

use std::sync::Arc;

use crate::node::VersionNode;

/// Recompute `child_count` for every node currently tracked by the
/// registry, then collapse single-child parents along the path from `head`
/// to the root.
pub(crate) fn compact(head: &Arc<VersionNode>, all_nodes: &mut Vec<Arc<VersionNode>>) {
    recompute_child_counts(all_nodes);

    let mut current = head.clone();
    loop {
        let parent = current.state.lock().parent.clone();
        let parent = match parent {
            Some(parent) => parent,
            None => break,
        };

        let parent_child_count = parent.state.lock().child_count;
        if parent_child_count == 1 {
            merge_parent_into_child(&current, &parent);
            all_nodes.retain(|node| node.id() != parent.id());
            // `current`'s parent just became its former grandparent; loop
            // again from the same node in case that link is collapsible
            // too.
        } else {
            current = parent;
        }
    }
}

fn recompute_child_counts(all_nodes: &[Arc<VersionNode>]) {
    for node in all_nodes {
        node.state.lock().child_count = 0;
    }
    for node in all_nodes {
        let parent = node.state.lock().parent.clone();
        if let Some(parent) = parent {
            parent.state.lock().child_count += 1;
        }
    }
}

/// Move every segment from `parent` that `child` doesn't already have a
/// newer copy of into `child`, then splice `parent`'s parent into
/// `child`'s parent pointer. `parent` is left empty and parentless; the
/// caller removes it from the registry's bookkeeping list.
fn merge_parent_into_child(child: &Arc<VersionNode>, parent: &Arc<VersionNode>) {
    let grandparent = {
        let mut parent_state = parent.state.lock();
        let mut child_state = child.state.lock();
        for (seg_nr, segment) in std::mem::take(&mut parent_state.segments) {
            // `or_insert` is a no-op if `child` already has a (necessarily
            // newer) segment at this slot, which drops the parent's stale
            // copy exactly as intended.
            child_state.segments.entry(seg_nr).or_insert(segment);
        }
        parent_state.parent.take()
    };
    child.state.lock().parent = grandparent;
}
