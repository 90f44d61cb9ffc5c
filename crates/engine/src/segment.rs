//! Segments: the fixed-size unit of conflict detection.

/// A version id. `0` is reserved for the [`NULL_VERSION`] / null segment;
/// real transactions are allocated `1..`.
pub type VersionId = u64;

/// The version id of the null segment: the implicit all-zero value present
/// at every segment number that no ancestor has ever written.
pub const NULL_VERSION: VersionId = 0;

/// A segment number (offset into the store, in units of `segment_size`).
pub type SegmentNumber = u64;

/// A fixed-size byte array tagged with the version that produced it.
///
/// Once inserted into a version node a segment is never mutated in place by
/// anyone other than the transaction that owns it (copy-on-write: a writer
/// that needs to change bytes in a segment it doesn't already own in its
/// own version node clones a fresh `Segment` tagged with its own version
/// id, rather than mutating the shared one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    version_id: VersionId,
    data: Vec<u8>,
}

impl Segment {
    /// Construct a segment owning `data`, tagged with `version_id`.
    pub fn new(version_id: VersionId, data: Vec<u8>) -> Segment {
        Segment { version_id, data }
    }

    /// Build the null segment: `size` zero bytes tagged with
    /// [`NULL_VERSION`].
    pub fn null(size: usize) -> Segment {
        Segment::new(NULL_VERSION, vec![0u8; size])
    }

    /// The version id of the transaction that wrote this segment.
    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// The segment's bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the segment's bytes. Only ever called on a segment
    /// that has just been copy-on-written into the caller's own, not yet
    /// committed version node, so there is no concurrent reader to race.
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
