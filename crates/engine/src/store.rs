//! The transactional segment store (C4, C6, C7): registry, accessors, and
//! the commit protocol.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};

use crate::commit::{rebase_check, Intent, Outcome};
use crate::compact;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::node::VersionNode;
use crate::segment::{Segment, SegmentNumber};
use crate::transaction::{ReadRecord, Transaction};

struct CommitSerializerState {
    commits_since_compact: usize,
}

/// A transactional, copy-on-write, multi-version segment store.
///
/// Every concurrent [`Store::begin`] call is an independent
/// snapshot-isolated transaction. A transaction's writes become visible to
/// new transactions only once [`Store::finish`] is called with
/// [`Intent::Commit`] and the commit's optimistic read-set check passes;
/// otherwise it is rolled back and has no effect. See the crate-level docs
/// for the full concurrency model.
pub struct Store {
    config: StoreConfig,

    /// Gate: accessors, commit, and rollback hold the reader side;
    /// compaction holds the writer side, exclusive of everyone else. Does
    /// not itself own chain data — each [`VersionNode`] guards its own
    /// mutable state — it exists purely to enforce the discipline that
    /// compaction never races a concurrent read of the chain it is
    /// restructuring.
    chain_lock: RwLock<()>,

    /// Published head, updated with release semantics on commit and read
    /// with acquire semantics by every `begin`; an RCU-style pointer swap
    /// without needing real RCU.
    head: ArcSwap<VersionNode>,

    /// Serializes commit attempts: at most one transaction may be
    /// validating-and-publishing at a time. Strictly inside `chain_lock`'s
    /// reader side — a commit attempt must never try to acquire
    /// `chain_lock` for writing while holding this.
    commit_serializer: Mutex<CommitSerializerState>,

    /// Monotonic version id allocator. Version 0 is reserved for the null
    /// segment; the first transaction receives 1.
    next_version_id: AtomicU64,

    /// Every version node currently in existence: committed ancestors of
    /// head, head itself, and every still in-flight transaction's tentative
    /// node. Used by the compactor to recompute child counts, and by
    /// rollback to remove a discarded node from bookkeeping.
    all_nodes: Mutex<Vec<Arc<VersionNode>>>,

    /// The process-wide (per-store) all-zero segment.
    null_segment: Segment,
}

impl Store {
    /// Build a store with the default configuration (`segment_size = 1`,
    /// `commits_before_compaction = 15`).
    pub fn new() -> Store {
        Store::with_config(StoreConfig::default_config())
    }

    /// Build a store with an explicit, already-validated configuration.
    pub fn with_config(config: StoreConfig) -> Store {
        let null_segment = Segment::null(config.segment_size());
        let root = VersionNode::root();
        Store {
            chain_lock: RwLock::new(()),
            head: ArcSwap::new(root.clone()),
            commit_serializer: Mutex::new(CommitSerializerState {
                commits_since_compact: 0,
            }),
            next_version_id: AtomicU64::new(1),
            all_nodes: Mutex::new(vec![root]),
            null_segment,
            config,
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Begin a new transaction hanging off the current head.
    pub fn begin(&self) -> Transaction {
        let parent = self.head.load_full();
        let node = VersionNode::new_leaf(parent);
        self.all_nodes.lock().push(node.clone());
        let version_id = self.next_version_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(version_id, "transaction begin");
        Transaction::new(version_id, node)
    }

    /// Read an entire segment as seen by `trans`: its own writes overlaid
    /// on the ancestor chain it started from.
    ///
    /// A non-recursive hit in `trans`'s own version node never touches the
    /// read set (the transaction trivially agrees with its own writes);
    /// any other outcome records `(seg_nr, version_id_observed)` so that
    /// commit can later revalidate it against the head at that time.
    pub fn read(&self, trans: &mut Transaction, seg_nr: SegmentNumber) -> Vec<u8> {
        let _guard = self.chain_lock.read();

        if let Some(seg) = trans.node.lookup_local(seg_nr) {
            return seg.data().to_vec();
        }

        let parent = trans.node.state.lock().parent.clone();
        let found = match parent {
            Some(parent) => parent.lookup_recursive(seg_nr, &self.null_segment),
            None => self.null_segment.clone(),
        };

        trans.reads.push(ReadRecord {
            seg_nr,
            version_id: found.version_id(),
        });

        found.data().to_vec()
    }

    /// Write `bytes` into segment `seg_nr` at `offset_in_segment`,
    /// copy-on-writing the segment into `trans`'s own version node first if
    /// it doesn't already own a writable copy.
    ///
    /// Returns `Result` for symmetry with the rest of the public interface
    /// and to leave room for future fallible paths (e.g. a backing
    /// allocator reporting exhaustion); bounds violations
    /// (`offset_in_segment + bytes.len() > segment_size`) are a programmer
    /// error at this layer — the byte-addressed session adapter is
    /// responsible for splitting writes at segment boundaries — and are
    /// checked with `debug_assert!` rather than a recoverable error.
    pub fn write(
        &self,
        trans: &mut Transaction,
        seg_nr: SegmentNumber,
        offset_in_segment: usize,
        bytes: &[u8],
    ) -> Result<()> {
        let _guard = self.chain_lock.read();

        if trans.node.lookup_local(seg_nr).is_none() {
            let parent = trans.node.state.lock().parent.clone();
            let source = match parent {
                Some(parent) => parent.lookup_recursive(seg_nr, &self.null_segment),
                None => self.null_segment.clone(),
            };
            let fresh = Segment::new(trans.version_id, source.data().to_vec());
            trans.node.insert(seg_nr, fresh);
        }

        let mut state = trans.node.state.lock();
        let segment = state
            .segments
            .get_mut(&seg_nr)
            .expect("segment was just copy-on-written into this transaction's node");

        debug_assert!(
            offset_in_segment + bytes.len() <= segment.data().len(),
            "write out of segment bounds"
        );

        let data = segment.data_mut();
        data[offset_in_segment..offset_in_segment + bytes.len()].copy_from_slice(bytes);

        Ok(())
    }

    /// Commit or roll back `trans`, consuming the handle.
    pub fn finish(&self, trans: Transaction, intent: Intent) -> Outcome {
        let chain_guard = self.chain_lock.read();

        let Transaction {
            version_id,
            node,
            reads,
        } = trans;

        if intent == Intent::Rollback {
            self.discard(&node);
            tracing::debug!(version_id, "transaction rolled back (requested)");
            return Outcome::RolledBack;
        }

        let (outcome, compaction_needed) = {
            let mut serializer = self.commit_serializer.lock();
            let candidate_head = self.head.load_full();

            if rebase_check(&reads, &candidate_head) {
                if node.is_empty() {
                    // Nothing was written; publishing an empty leaf would
                    // only grow the chain for no observable benefit.
                    self.discard(&node);
                    tracing::debug!(version_id, "transaction committed (no-op, no writes)");
                    (Outcome::Committed, false)
                } else {
                    node.state.lock().parent = Some(candidate_head);
                    self.head.store(node.clone());
                    serializer.commits_since_compact += 1;
                    let compaction_needed = serializer.commits_since_compact
                        > self.config.commits_before_compaction();
                    tracing::info!(version_id, "transaction committed");
                    (Outcome::Committed, compaction_needed)
                }
            } else {
                tracing::debug!(version_id, "transaction rolled back (commit conflict)");
                (Outcome::RolledBack, false)
            }
        };

        if outcome == Outcome::RolledBack {
            self.discard(&node);
        }

        // Compaction needs the writer lock; release the reader lock first,
        // per the ordering rule (never request the writer lock while
        // holding the reader lock or the serializer).
        drop(chain_guard);

        if compaction_needed {
            self.compact();
        }

        outcome
    }

    fn discard(&self, node: &Arc<VersionNode>) {
        self.all_nodes.lock().retain(|n| n.id() != node.id());
    }

    /// Run the chain compactor: collapse single-child parents along the
    /// path from head to the root. Exposed for callers (tests, the session
    /// layer) that want to force an out-of-band compaction rather than
    /// waiting for the commit counter.
    pub fn compact(&self) {
        tracing::info!("compacting version chain");
        let _guard = self.chain_lock.write();
        let mut nodes = self.all_nodes.lock();
        let head = self.head.load_full();
        compact::compact(&head, &mut nodes);
        drop(nodes);
        self.commit_serializer.lock().commits_since_compact = 0;
    }

    /// Number of edges from head back to the root, through `parent`
    /// pointers. Used by tests to confirm compaction bounds chain depth;
    /// not part of the documented external interface.
    pub fn chain_depth(&self) -> usize {
        let _guard = self.chain_lock.read();
        let mut node = self.head.load_full();
        let mut depth = 0usize;
        loop {
            let parent = node.state.lock().parent.clone();
            match parent {
                Some(parent) => {
                    depth += 1;
                    node = parent;
                }
                None => break,
            }
        }
        depth
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("chain_depth", &self.chain_depth())
            .finish()
    }
}
