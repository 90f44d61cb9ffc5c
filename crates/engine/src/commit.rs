//! Commit protocol internals (C7): the rebase check.

use crate::node::VersionNode;
use crate::segment::NULL_VERSION;
use crate::transaction::ReadRecord;

/// Outcome of [`crate::store::Store::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The transaction's writes are now visible from head.
    Committed,
    /// The transaction's writes were discarded.
    RolledBack,
}

/// What the caller asked `finish` to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Commit,
    Rollback,
}

/// Validate a transaction's read set against a candidate head.
///
/// For every `(seg_nr, v_recorded)` the transaction read from its original
/// parent chain, look up `seg_nr` in `candidate` (non-recursively — a
/// segment that isn't present in `candidate` itself, but is present further
/// up its ancestry, still counts as "absent from candidate" for this
/// check, because what matters is whether `candidate` introduced a newer
/// write at that slot since the transaction began).
///
/// An absent segment is treated as version id [`NULL_VERSION`] (`0`). This
/// resolves the ambiguity in the original kernel module, whose equivalent
/// lookup dereferenced a possibly-absent result unconditionally: this
/// rewrite adopts "collision iff the version id differs, treating absent
/// as version 0" so that a never-written segment consistently reads as
/// version 0 everywhere, including in this check.
///
/// Returns `true` if every entry still matches (rebase succeeds).
pub(crate) fn rebase_check(reads: &[ReadRecord], candidate: &VersionNode) -> bool {
    reads.iter().all(|read| {
        let observed = candidate
            .lookup_local(read.seg_nr)
            .map(|seg| seg.version_id())
            .unwrap_or(NULL_VERSION);
        observed == read.version_id
    })
}
