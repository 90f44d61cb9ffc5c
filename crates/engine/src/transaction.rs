//! Transaction context (C5).

use std::sync::Arc;

use crate::node::VersionNode;
use crate::segment::{SegmentNumber, VersionId};

/// One entry of a transaction's read set: the segment read, and the version
/// id observed for it at the time of the read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadRecord {
    pub(crate) seg_nr: SegmentNumber,
    pub(crate) version_id: VersionId,
}

/// A pending write on top of some parent version.
///
/// Owns its own (not yet published) [`VersionNode`], its read set, and its
/// version id. A `Transaction` is consumed by
/// [`crate::store::Store::finish`]: there is no way to keep using a handle
/// after it commits or rolls back.
pub struct Transaction {
    pub(crate) version_id: VersionId,
    pub(crate) node: Arc<VersionNode>,
    pub(crate) reads: Vec<ReadRecord>,
}

impl Transaction {
    pub(crate) fn new(version_id: VersionId, node: Arc<VersionNode>) -> Transaction {
        Transaction {
            version_id,
            node,
            reads: Vec::new(),
        }
    }

    /// The version id allocated to this transaction at `begin`.
    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// Number of distinct ancestor segments this transaction has read so
    /// far (reads of its own not-yet-committed writes are not tracked, per
    /// the rationale in §4.4 of the design).
    pub fn read_set_len(&self) -> usize {
        self.reads.len()
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("version_id", &self.version_id)
            .field("reads", &self.reads.len())
            .finish()
    }
}
