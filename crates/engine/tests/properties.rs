//! Property-based tests for the core concurrency invariants.

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use rand::Rng;

use segdb_engine::{Intent, Outcome, Store, StoreConfigBuilder};

fn store_with_segment_size(segment_size: usize) -> Store {
    Store::with_config(
        StoreConfigBuilder::new()
            .segment_size(segment_size.max(1))
            .commits_before_compaction(1_000)
            .build()
            .unwrap(),
    )
}

/// I-NULL-FLOOR: a segment nobody has ever written reads back as all zero
/// bytes, regardless of which segment number is probed.
#[quickcheck]
fn never_written_segment_is_all_zero(seg_nr: u64, segment_size: u8) -> bool {
    let store = store_with_segment_size(segment_size as usize);
    let mut trans = store.begin();
    let bytes = store.read(&mut trans, seg_nr);
    bytes.iter().all(|&b| b == 0)
}

/// I-READ-SNAPSHOT: once a transaction has begun, nothing committed by
/// another transaction afterwards changes what it reads back for a segment
/// it already read once.
#[quickcheck]
fn snapshot_is_immune_to_later_commits(seg_nr: u64, first: u8, second: u8) -> bool {
    let store = store_with_segment_size(1);

    let mut reader = store.begin();
    let before = store.read(&mut reader, seg_nr);

    let mut writer_a = store.begin();
    store.write(&mut writer_a, seg_nr, 0, &[first]).unwrap();
    store.finish(writer_a, Intent::Commit);

    let mut writer_b = store.begin();
    store.write(&mut writer_b, seg_nr, 0, &[second]).unwrap();
    store.finish(writer_b, Intent::Commit);

    let after = store.read(&mut reader, seg_nr);
    before == after
}

/// I-SNAPSHOT-ISOLATION: two transactions writing disjoint segments never
/// collide, no matter the interleaving of their begin/write/finish calls.
#[quickcheck]
fn disjoint_segments_never_collide(seg_a: u64, seg_b: u64, val_a: u8, val_b: u8) -> TestResult {
    if seg_a == seg_b {
        return TestResult::discard();
    }
    let store = store_with_segment_size(1);

    let mut a = store.begin();
    let mut b = store.begin();
    store.write(&mut a, seg_a, 0, &[val_a]).unwrap();
    store.write(&mut b, seg_b, 0, &[val_b]).unwrap();

    let a_outcome = store.finish(a, Intent::Commit);
    let b_outcome = store.finish(b, Intent::Commit);

    TestResult::from_bool(a_outcome == Outcome::Committed && b_outcome == Outcome::Committed)
}

/// I-NO-ZOMBIE: a rolled-back transaction's writes are never visible to any
/// later transaction, whether rolled back explicitly or due to a commit
/// conflict.
#[quickcheck]
fn rolled_back_writes_never_become_visible(seg_nr: u64, value: u8) -> bool {
    let store = store_with_segment_size(1);

    let mut trans = store.begin();
    store.write(&mut trans, seg_nr, 0, &[value]).unwrap();
    store.finish(trans, Intent::Rollback);

    let mut reader = store.begin();
    store.read(&mut reader, seg_nr) == vec![0u8]
}

/// I-COMPACT-TRANSPARENT: running compaction never changes what any live
/// segment reads back.
#[quickcheck]
fn compaction_does_not_change_observable_state(writes: Vec<(u8, u8)>) -> bool {
    let store = Store::with_config(
        StoreConfigBuilder::new()
            .segment_size(1)
            .commits_before_compaction(1_000_000)
            .build()
            .unwrap(),
    );

    for (seg, val) in &writes {
        let mut trans = store.begin();
        store.write(&mut trans, *seg as u64, 0, &[*val]).unwrap();
        store.finish(trans, Intent::Commit);
    }

    let mut before = Vec::new();
    for seg in 0u8..=255 {
        let mut reader = store.begin();
        before.push(store.read(&mut reader, seg as u64));
    }

    store.compact();

    for seg in 0u8..=255 {
        let mut reader = store.begin();
        if store.read(&mut reader, seg as u64) != before[seg as usize] {
            return false;
        }
    }
    true
}

/// I-COMMIT-SERIALIZED: of any number of transactions that all read then
/// write the same single segment concurrently, exactly one commits and the
/// rest roll back with a conflict.
#[test]
fn exactly_one_winner_among_contending_writers() {
    let mut rng = rand::thread_rng();
    for _ in 0..50 {
        let store = store_with_segment_size(1);
        let seg_nr = 0u64;
        let n = rng.gen_range(2..8);

        let mut transactions: Vec<_> = (0..n)
            .map(|_| {
                let mut trans = store.begin();
                let _ = store.read(&mut trans, seg_nr);
                trans
            })
            .collect();

        for (i, trans) in transactions.iter_mut().enumerate() {
            store.write(trans, seg_nr, 0, &[i as u8]).unwrap();
        }

        let mut wins = 0;
        for trans in transactions {
            if store.finish(trans, Intent::Commit) == Outcome::Committed {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
