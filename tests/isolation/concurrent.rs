//! Transactions running side by side on one store

use crate::common::*;
use parking_lot::Mutex;
use std::sync::Barrier;
use std::thread;

#[test]
fn transactions_do_not_see_each_others_writes() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 4);

    let a = ts.source().with_transaction(Transaction::begin());
    let b = ts.source().with_transaction(Transaction::begin());

    a.add_feature(ts.parcel("residential", 1, 9.0, 9.0)).unwrap();
    b.remove_feature(&committed[0]).unwrap();
    b.remove_feature(&committed[1]).unwrap();

    assert_eq!(a.count(&Query::all()).unwrap(), Some(5));
    assert_eq!(b.count(&Query::all()).unwrap(), Some(2));
    assert_eq!(ids(&a.all_features().unwrap()).len(), 5);
    assert_eq!(ids(&b.all_features().unwrap()).len(), 2);

    a.transaction().commit().unwrap();
    // b now sees a's committed add on top of its own removals
    assert_eq!(b.count(&Query::all()).unwrap(), Some(3));
}

#[test]
fn parallel_transactions_stage_and_commit() {
    const THREADS: usize = 8;
    const ADDS: usize = 25;

    let ts = TestStore::new();
    ts.seed("residential", 10);
    let barrier = Barrier::new(THREADS);
    let observed = Mutex::new(Vec::with_capacity(THREADS));

    thread::scope(|s| {
        for t in 0..THREADS {
            let ts = &ts;
            let barrier = &barrier;
            let observed = &observed;
            s.spawn(move || {
                let source = ts.source().with_transaction(Transaction::begin());
                barrier.wait();
                for i in 0..ADDS {
                    source
                        .add_feature(ts.parcel("residential", i as i64, t as f64, i as f64))
                        .unwrap();
                }
                let seen = source.count(&Query::all()).unwrap();
                observed.lock().push(seen);
                barrier.wait();
                source.transaction().commit().unwrap();
            });
        }
    });

    // every transaction saw the committed 10 plus only its own adds
    let observed = observed.into_inner();
    assert_eq!(observed.len(), THREADS);
    assert!(observed.iter().all(|c| *c == Some((10 + ADDS) as u64)));
    assert_eq!(ts.committed(), 10 + THREADS * ADDS);
}

#[test]
fn shared_transaction_across_threads() {
    let ts = TestStore::new();
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());

    thread::scope(|s| {
        for t in 0..4 {
            let source = source.clone();
            let ts = &ts;
            s.spawn(move || {
                for i in 0..10 {
                    source
                        .add_feature(ts.parcel("residential", i, t as f64, i as f64))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(source.count(&Query::all()).unwrap(), Some(40));
    txn.commit().unwrap();
    assert_eq!(ts.committed(), 40);
}

#[test]
fn state_held_across_commit_refuses_late_writes() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 2);
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());
    source.add_feature(ts.parcel("residential", 1, 9.0, 9.0)).unwrap();

    let held = txn.state(ts.store.store_id()).unwrap();
    txn.commit().unwrap();
    assert_eq!(ts.committed(), 3);

    let diff = held.as_diff_state().unwrap();
    let closed = |r: StrataResult<()>| matches!(r, Err(StrataError::TransactionClosed { .. }));
    assert!(closed(diff.stage_add(ts.parcel("residential", 2, 0.0, 0.0)).map(|_| ())));
    assert!(closed(diff.stage_remove(TYPE, &committed[0])));
    assert!(diff.diff().is_empty());
    assert_eq!(ts.committed(), 3);
}

#[test]
fn writes_racing_commit_are_committed_or_refused() {
    const WRITERS: usize = 4;
    const ATTEMPTS: usize = 200;

    init_tracing();
    let ts = TestStore::new();
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());
    source.add_feature(ts.parcel("residential", 0, 0.0, 0.0)).unwrap();
    let state = txn.state(ts.store.store_id()).unwrap();
    let barrier = Barrier::new(WRITERS + 1);
    let accepted = Mutex::new(1usize);

    thread::scope(|s| {
        for t in 0..WRITERS {
            let (ts, state, barrier, accepted) = (&ts, &state, &barrier, &accepted);
            s.spawn(move || {
                let diff = state.as_diff_state().unwrap();
                barrier.wait();
                for i in 0..ATTEMPTS {
                    match diff.stage_add(ts.parcel("residential", i as i64, t as f64, i as f64)) {
                        Ok(_) => *accepted.lock() += 1,
                        Err(StrataError::TransactionClosed { .. }) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            });
        }
        barrier.wait();
        txn.commit().unwrap();
    });

    // every accepted write is either committed or still staged
    let staged = state.as_diff_state().unwrap().diff().len();
    let accepted = accepted.into_inner();
    assert_eq!(ts.committed() + staged, accepted);
    assert_eq!(staged, 0);
    assert_eq!(txn.status(), TransactionStatus::Committed);
}
