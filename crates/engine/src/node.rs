//! Version nodes: one delta in the version chain (C3).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::segment::{Segment, SegmentNumber};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a [`VersionNode`], stable for its lifetime. Used only
/// to find-and-remove a rolled-back transaction's node from the registry's
/// bookkeeping list; it carries no ordering meaning (unlike a segment's
/// [`crate::segment::VersionId`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The mutable part of a [`VersionNode`]: its owned segments, its parent
/// link, and its child count. Guarded by a per-node mutex so that the
/// chain-wide lock (see [`crate::store::Store`]) only needs to arbitrate
/// *when* mutation is allowed (compaction exclusive of everything else),
/// not provide the memory safety for it.
pub(crate) struct NodeState {
    pub(crate) segments: BTreeMap<SegmentNumber, Segment>,
    pub(crate) parent: Option<Arc<VersionNode>>,
    pub(crate) child_count: usize,
}

/// One node of the version chain.
///
/// Owns a sparse mapping from segment number to [`Segment`], a (nullable)
/// parent pointer, and a child count recomputed during compaction. Every
/// node created by [`crate::store::Store::begin`] lives in the store's
/// bookkeeping list (see the registry in `store.rs`) until either promoted
/// to head at commit or dropped at rollback.
pub struct VersionNode {
    id: NodeId,
    pub(crate) state: Mutex<NodeState>,
}

impl VersionNode {
    /// Build the root node: no parent, no segments.
    pub(crate) fn root() -> Arc<VersionNode> {
        Arc::new(VersionNode {
            id: NodeId::next(),
            state: Mutex::new(NodeState {
                segments: BTreeMap::new(),
                parent: None,
                child_count: 0,
            }),
        })
    }

    /// Build a new, empty leaf hanging off `parent`.
    pub(crate) fn new_leaf(parent: Arc<VersionNode>) -> Arc<VersionNode> {
        Arc::new(VersionNode {
            id: NodeId::next(),
            state: Mutex::new(NodeState {
                segments: BTreeMap::new(),
                parent: Some(parent),
                child_count: 0,
            }),
        })
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// Non-recursive lookup: `Some` only if this node itself owns the
    /// segment.
    pub(crate) fn lookup_local(&self, seg_nr: SegmentNumber) -> Option<Segment> {
        self.state.lock().segments.get(&seg_nr).cloned()
    }

    /// Recursive lookup: walks to the parent on miss, terminating at
    /// `null_segment` if the root is reached.
    pub(crate) fn lookup_recursive(&self, seg_nr: SegmentNumber, null_segment: &Segment) -> Segment {
        if let Some(seg) = self.lookup_local(seg_nr) {
            return seg;
        }

        let mut cursor = self.state.lock().parent.clone();
        loop {
            match cursor {
                Some(node) => {
                    let next = {
                        let state = node.state.lock();
                        if let Some(seg) = state.segments.get(&seg_nr) {
                            return seg.clone();
                        }
                        state.parent.clone()
                    };
                    cursor = next;
                }
                None => return null_segment.clone(),
            }
        }
    }

    /// Insert a segment into this node (used by copy-on-write).
    pub(crate) fn insert(&self, seg_nr: SegmentNumber, segment: Segment) {
        self.state.lock().segments.insert(seg_nr, segment);
    }

    /// Whether this node owns no segments at all (used to skip installing
    /// a no-op commit as a new head).
    pub(crate) fn is_empty(&self) -> bool {
        self.state.lock().segments.is_empty()
    }
}

impl std::fmt::Debug for VersionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VersionNode")
            .field("id", &self.id)
            .field("segments", &state.segments.len())
            .field("child_count", &state.child_count)
            .field(
                "parent",
                &state.parent.as_ref().map(|p| p.id),
            )
            .finish()
    }
}
