//! The byte-addressed session adapter.

use std::sync::Arc;

use segdb_engine::{Intent, Outcome, SegmentNumber, Store, Transaction};

use crate::error::Result;

/// A long-lived handle onto a [`Store`] that speaks plain byte offsets
/// instead of `(segment_number, offset_in_segment)` pairs.
///
/// A `Session` lazily begins a transaction on its first read or write after
/// construction, or after its previous transaction finished, and keeps
/// using that same transaction across calls until [`Session::commit`] or
/// [`Session::rollback`] is called. Dropping a `Session` with a pending
/// transaction rolls it back, so a panic or an early `return` never leaves
/// half-applied writes visible to anyone else.
pub struct Session {
    store: Arc<Store>,
    transaction: Option<Transaction>,
}

impl Session {
    /// Open a session against `store`. No transaction is begun yet.
    pub fn new(store: Arc<Store>) -> Session {
        Session {
            store,
            transaction: None,
        }
    }

    fn transaction(&mut self) -> &mut Transaction {
        if self.transaction.is_none() {
            self.transaction = Some(self.store.begin());
        }
        self.transaction.as_mut().expect("just populated")
    }

    /// Read `len` bytes starting at byte offset `offset`, splitting the
    /// request across as many segments as it spans.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let store = self.store.clone();
        let segment_size = store.config().segment_size() as u64;
        let mut out = Vec::with_capacity(len);
        let mut remaining = len;
        let mut cursor = offset;

        while remaining > 0 {
            let seg_nr = cursor / segment_size;
            let offset_in_segment = (cursor % segment_size) as usize;
            let take = remaining.min(segment_size as usize - offset_in_segment);

            let trans = self.transaction();
            let segment = store.read(trans, seg_nr as SegmentNumber);
            out.extend_from_slice(&segment[offset_in_segment..offset_in_segment + take]);

            cursor += take as u64;
            remaining -= take;
        }

        Ok(out)
    }

    /// Write `bytes` starting at byte offset `offset`, splitting the write
    /// across as many segments as it spans.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let store = self.store.clone();
        let segment_size = store.config().segment_size() as u64;
        let mut cursor = offset;
        let mut written = 0usize;

        while written < bytes.len() {
            let seg_nr = cursor / segment_size;
            let offset_in_segment = (cursor % segment_size) as usize;
            let take = (bytes.len() - written).min(segment_size as usize - offset_in_segment);

            let trans = self.transaction();
            store.write(
                trans,
                seg_nr as SegmentNumber,
                offset_in_segment,
                &bytes[written..written + take],
            )?;

            cursor += take as u64;
            written += take;
        }

        Ok(())
    }

    /// Commit the session's pending transaction, if any. A session with no
    /// pending transaction (nothing read or written since the last
    /// commit/rollback) trivially "commits" as a no-op.
    pub fn commit(&mut self) -> Outcome {
        match self.transaction.take() {
            Some(trans) => self.store.finish(trans, Intent::Commit),
            None => Outcome::Committed,
        }
    }

    /// Roll back the session's pending transaction, if any.
    pub fn rollback(&mut self) -> Outcome {
        match self.transaction.take() {
            Some(trans) => self.store.finish(trans, Intent::Rollback),
            None => Outcome::RolledBack,
        }
    }

    /// Whether this session currently has a pending (not yet committed or
    /// rolled back) transaction.
    pub fn has_pending_transaction(&self) -> bool {
        self.transaction.is_some()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(trans) = self.transaction.take() {
            tracing::debug!("session dropped with a pending transaction, rolling back");
            self.store.finish(trans, Intent::Rollback);
        }
    }
}
