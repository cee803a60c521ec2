//! Count reconciliation through the façade

use crate::common::*;
use proptest::prelude::*;

#[derive(Debug)]
struct Pessimistic;

impl TransactionState for Pessimistic {
    fn commit(&self) -> StrataResult<()> {
        Ok(())
    }

    fn rollback(&self) -> StrataResult<()> {
        Ok(())
    }
}

#[test]
fn exclude_counts_zero_without_store_access() {
    let ts = TestStore::new();
    ts.seed("residential", 4);
    let mut source = ts.source();
    source.set_transaction(Transaction::begin());
    source.add_feature(ts.parcel("residential", 1, 0.0, 0.0)).unwrap();

    let before = ts.store.read_count();
    assert_eq!(source.count(&Query::filtered(Filter::Exclude)).unwrap(), Some(0));
    assert_eq!(
        source
            .count(&Query::filtered(zone("residential").and(Filter::Exclude)))
            .unwrap(),
        Some(0)
    );
    assert_eq!(ts.store.read_count(), before);
}

#[test]
fn auto_commit_never_sees_staged_writes() {
    let ts = TestStore::new();
    ts.seed("residential", 2);

    let staging = ts.source().with_transaction(Transaction::begin());
    staging.add_feature(ts.parcel("residential", 1, 0.0, 0.0)).unwrap();

    let auto = ts.source();
    assert!(auto.transaction().is_auto_commit());
    assert_eq!(auto.count(&Query::all()).unwrap(), Some(2));
    assert_eq!(staging.count(&Query::all()).unwrap(), Some(3));
}

#[test]
fn removing_non_matching_feature_keeps_filtered_count() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let industrial = ts.seed("industrial", 2);

    let source = ts.source().with_transaction(Transaction::begin());
    source.remove_feature(&industrial[0]).unwrap();

    assert_eq!(source.count(&Query::filtered(zone("residential"))).unwrap(), Some(3));
    assert_eq!(source.count(&Query::all()).unwrap(), Some(4));
}

#[test]
fn removing_staged_addition_cancels_it() {
    let ts = TestStore::new();
    ts.seed("residential", 3);

    let source = ts.source().with_transaction(Transaction::begin());
    let id = source.add_feature(ts.parcel("residential", 1, 0.0, 0.0)).unwrap();
    assert_eq!(source.count(&Query::all()).unwrap(), Some(4));

    source.remove_feature(&id).unwrap();
    assert_eq!(source.count(&Query::all()).unwrap(), Some(3));
}

#[test]
fn faithful_mode_ignores_match_flips() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 3);

    let source = ts.source().with_transaction(Transaction::begin());
    source
        .modify_feature(&committed[0], ts.parcel("industrial", 1, 0.0, 0.0))
        .unwrap();

    assert_eq!(source.count(&Query::filtered(zone("residential"))).unwrap(), Some(3));
    // the merged read does reflect the flip
    assert_eq!(ids(&source.features_filtered(zone("residential")).unwrap()).len(), 2);
}

#[test]
fn corrected_mode_accounts_for_match_flips() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 3);
    let industrial = ts.seed("industrial", 1);

    let source = ts
        .source_with(SourceOptions::new().reconciliation(ReconciliationMode::Corrected))
        .with_transaction(Transaction::begin());
    source
        .modify_feature(&committed[0], ts.parcel("industrial", 1, 0.0, 0.0))
        .unwrap();
    source
        .modify_feature(&committed[1], ts.parcel("industrial", 1, 1.0, 1.0))
        .unwrap();
    source
        .modify_feature(&industrial[0], ts.parcel("residential", 1, 3.0, 3.0))
        .unwrap();

    let query = Query::filtered(zone("residential"));
    assert_eq!(source.count(&query).unwrap(), Some(2));
    assert_eq!(source.features(&query).unwrap().to_vec().unwrap().len(), 2);
}

#[test]
fn unreconcilable_state_makes_count_unknown() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let txn = Transaction::begin();
    txn.put_state(ts.store.store_id(), Arc::new(Pessimistic)).unwrap();
    let source = ts.source().with_transaction(txn);

    assert_eq!(source.count(&Query::all()).unwrap(), None);

    let err = source
        .add_feature(ts.parcel("residential", 1, 0.0, 0.0))
        .unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn unknown_native_count_stays_unknown() {
    let ts = TestStore::with_store(MemoryStore::builder().without_native_count().build());
    ts.seed("residential", 3);
    let source = ts.source().with_transaction(Transaction::begin());
    source.add_feature(ts.parcel("residential", 1, 0.0, 0.0)).unwrap();

    assert_eq!(source.count(&Query::all()).unwrap(), None);
    assert_eq!(source.all_features().unwrap().size().unwrap(), None);
    // reads still work
    assert_eq!(ids(&source.all_features().unwrap()).len(), 4);
}

#[test]
fn count_of_other_type_uses_own_type() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source();

    assert_eq!(source.count(&Query::named("rivers")).unwrap(), Some(3));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn count_is_native_plus_adds_minus_removals(
        matching in 0usize..10,
        other in 0usize..5,
        adds in proptest::collection::vec(any::<bool>(), 0..6),
        removals in proptest::collection::vec(any::<bool>(), 15),
    ) {
        let ts = TestStore::new();
        let mut committed = ts.seed("residential", matching);
        committed.extend(ts.seed("industrial", other));
        let source = ts.source().with_transaction(Transaction::begin());

        let mut added = 0u64;
        for (i, residential) in adds.iter().enumerate() {
            let zone_name = if *residential { "residential" } else { "industrial" };
            source.add_feature(ts.parcel(zone_name, 1, i as f64, 0.0)).unwrap();
            added += u64::from(*residential);
        }
        let mut removed = 0u64;
        for (i, (id, remove)) in committed.iter().zip(&removals).enumerate() {
            if *remove {
                source.remove_feature(id).unwrap();
                removed += u64::from(i < matching);
            }
        }

        let count = source.count(&Query::filtered(zone("residential"))).unwrap();
        prop_assert_eq!(count, Some(matching as u64 + added - removed));
        let read = source.features_filtered(zone("residential")).unwrap().to_vec().unwrap();
        prop_assert_eq!(read.len() as u64, matching as u64 + added - removed);
    }
}
