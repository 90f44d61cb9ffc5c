//! `segdb-engine`: a transactional, copy-on-write, multi-version segment
//! store with optimistic concurrency control.
//!
//! A store is a flat address space divided into fixed-size segments. Every
//! [`Store::begin`] hands out an independent, snapshot-isolated
//! [`Transaction`]; reads and writes against it are staged in a private
//! version node until [`Store::finish`] either publishes it as the new head
//! (if nothing it read has changed since) or rolls it back. A background
//! (but never concurrent with an in-flight commit) compaction pass keeps
//! the version chain from growing without bound.
//!
//! See `SPEC_FULL.md` in the repository root for the full design.

mod commit;
mod compact;
mod config;
mod error;
mod node;
mod segment;
mod store;
mod transaction;

pub use commit::{Intent, Outcome};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Error, Result};
pub use segment::{SegmentNumber, VersionId, NULL_VERSION};
pub use store::Store;
pub use transaction::Transaction;

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_store() -> Store {
        Store::with_config(
            StoreConfigBuilder::new()
                .segment_size(1)
                .commits_before_compaction(1_000)
                .build()
                .unwrap(),
        )
    }

    /// Boundary scenario: a cold read of a never-written segment returns the
    /// all-zero null segment.
    #[test]
    fn cold_read_returns_null_segment() {
        let store = tiny_store();
        let mut trans = store.begin();
        let value = store.read(&mut trans, 42);
        assert_eq!(value, vec![0u8]);
    }

    /// Boundary scenario: write, commit, then read from a fresh transaction
    /// observes the write.
    #[test]
    fn write_commit_read_round_trips() {
        let store = tiny_store();

        let mut writer = store.begin();
        store.write(&mut writer, 7, 0, &[9]).unwrap();
        assert_eq!(store.finish(writer, Intent::Commit), Outcome::Committed);

        let mut reader = store.begin();
        assert_eq!(store.read(&mut reader, 7), vec![9u8]);
    }

    /// Boundary scenario: two transactions that both read and then write the
    /// same segment conflict; the second to commit is rolled back.
    #[test]
    fn optimistic_collision_rolls_back_the_loser() {
        let store = tiny_store();

        let mut seed = store.begin();
        store.write(&mut seed, 3, 0, &[1]).unwrap();
        assert_eq!(store.finish(seed, Intent::Commit), Outcome::Committed);

        let mut first = store.begin();
        let mut second = store.begin();

        let _ = store.read(&mut first, 3);
        let _ = store.read(&mut second, 3);

        store.write(&mut first, 3, 0, &[2]).unwrap();
        store.write(&mut second, 3, 0, &[3]).unwrap();

        assert_eq!(store.finish(first, Intent::Commit), Outcome::Committed);
        assert_eq!(store.finish(second, Intent::Commit), Outcome::RolledBack);

        let mut reader = store.begin();
        assert_eq!(store.read(&mut reader, 3), vec![2u8]);
    }

    /// Boundary scenario: two transactions that touch disjoint segments both
    /// commit even though they overlapped in time.
    #[test]
    fn disjoint_writes_coexist() {
        let store = tiny_store();

        let mut a = store.begin();
        let mut b = store.begin();

        store.write(&mut a, 1, 0, &[10]).unwrap();
        store.write(&mut b, 2, 0, &[20]).unwrap();

        assert_eq!(store.finish(a, Intent::Commit), Outcome::Committed);
        assert_eq!(store.finish(b, Intent::Commit), Outcome::Committed);

        let mut reader = store.begin();
        assert_eq!(store.read(&mut reader, 1), vec![10u8]);
        assert_eq!(store.read(&mut reader, 2), vec![20u8]);
    }

    /// Boundary scenario: compaction collapses the chain without changing
    /// observable state.
    #[test]
    fn chain_compaction_preserves_state_and_bounds_depth() {
        let store = Store::with_config(
            StoreConfigBuilder::new()
                .segment_size(1)
                .commits_before_compaction(3)
                .build()
                .unwrap(),
        );

        for i in 0..10u64 {
            let mut trans = store.begin();
            store.write(&mut trans, i, 0, &[i as u8]).unwrap();
            assert_eq!(store.finish(trans, Intent::Commit), Outcome::Committed);
        }

        assert_eq!(store.chain_depth(), 1);

        let mut reader = store.begin();
        for i in 0..10u64 {
            assert_eq!(store.read(&mut reader, i), vec![i as u8]);
        }
    }

    /// Boundary scenario: an explicit rollback has no side effect on later
    /// transactions.
    #[test]
    fn rollback_has_no_side_effect() {
        let store = tiny_store();

        let mut trans = store.begin();
        store.write(&mut trans, 5, 0, &[99]).unwrap();
        assert_eq!(store.finish(trans, Intent::Rollback), Outcome::RolledBack);

        let mut reader = store.begin();
        assert_eq!(store.read(&mut reader, 5), vec![0u8]);
    }

    /// A transaction reads a value only once at its snapshot point; a write
    /// committed by another transaction afterwards is invisible to an
    /// already-begun reader.
    #[test]
    fn snapshot_is_stable_across_concurrent_commits() {
        let store = tiny_store();

        let mut reader = store.begin();
        assert_eq!(store.read(&mut reader, 1), vec![0u8]);

        let mut writer = store.begin();
        store.write(&mut writer, 1, 0, &[7]).unwrap();
        assert_eq!(store.finish(writer, Intent::Commit), Outcome::Committed);

        assert_eq!(store.read(&mut reader, 1), vec![0u8]);
    }
}
