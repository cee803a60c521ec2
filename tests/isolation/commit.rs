//! Transaction lifecycle: commit, rollback, retry after failure

use crate::common::*;

#[test]
fn commit_applies_diff_and_clears_it() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 3);
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());

    source.add_feature(ts.parcel("residential", 1, 9.0, 9.0)).unwrap();
    source.remove_feature(&committed[0]).unwrap();
    source
        .modify_feature(&committed[1], ts.parcel("industrial", 2, 1.0, 1.0))
        .unwrap();
    assert_eq!(ts.committed(), 3);

    txn.commit().unwrap();

    assert_eq!(txn.status(), TransactionStatus::Committed);
    assert_eq!(ts.committed(), 3);
    let auto = ts.source();
    assert_eq!(auto.count(&Query::filtered(zone("residential"))).unwrap(), Some(2));
    assert_eq!(auto.count(&Query::filtered(zone("industrial"))).unwrap(), Some(1));
    assert!(ts.store.fetch(TYPE, &committed[0]).unwrap().is_none());

    // committed adds get store ids
    assert!(ids(&auto.all_features().unwrap())
        .iter()
        .all(|id| !id.is_provisional()));
}

#[test]
fn rollback_leaves_store_untouched() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 2);
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());

    source.add_feature(ts.parcel("residential", 1, 9.0, 9.0)).unwrap();
    source.remove_feature(&committed[0]).unwrap();
    let state = txn.state(ts.store.store_id()).unwrap();

    txn.rollback().unwrap();

    assert_eq!(txn.status(), TransactionStatus::RolledBack);
    assert!(state.as_diff_state().unwrap().diff().is_empty());
    assert_eq!(ids(&ts.source().all_features().unwrap()), committed);
}

#[test]
fn closed_transaction_rejects_writes() {
    let ts = TestStore::new();
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());
    txn.commit().unwrap();

    let err = source
        .add_feature(ts.parcel("residential", 1, 0.0, 0.0))
        .unwrap_err();
    assert!(matches!(err, StrataError::TransactionClosed { .. }));
    assert!(matches!(txn.commit(), Err(StrataError::TransactionClosed { .. })));
    assert!(matches!(txn.rollback(), Err(StrataError::TransactionClosed { .. })));
}

#[test]
fn failed_commit_keeps_unapplied_entries_for_retry() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 2);
    let txn = Transaction::begin();
    let source = ts.source().with_transaction(txn.clone());

    source.remove_feature(&committed[0]).unwrap();
    source.add_feature(ts.parcel("residential", 1, 5.0, 5.0)).unwrap();
    source.add_feature(ts.parcel("residential", 2, 6.0, 6.0)).unwrap();

    // removal and first insert land, second insert fails
    ts.store.set_write_budget(Some(2));
    let err = txn.commit().unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(txn.status(), TransactionStatus::Active);
    assert_eq!(ts.committed(), 2);

    let state = txn.state(ts.store.store_id()).unwrap();
    assert_eq!(state.as_diff_state().unwrap().diff().len(), 1);
    assert_eq!(source.count(&Query::all()).unwrap(), Some(3));

    ts.store.set_write_budget(None);
    txn.commit().unwrap();
    assert_eq!(txn.status(), TransactionStatus::Committed);
    assert_eq!(ts.committed(), 3);
}

#[test]
fn modify_unknown_feature_is_not_found() {
    let ts = TestStore::new();
    let source = ts.source().with_transaction(Transaction::begin());

    let err = source
        .modify_feature(&FeatureId::new("parcels.404"), ts.parcel("x", 1, 0.0, 0.0))
        .unwrap_err();
    assert!(err.is_not_found());
    let err = source.remove_feature(&FeatureId::provisional()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn provided_ids_survive_commit_when_supported() {
    let ts = TestStore::new();
    let txn = Transaction::begin();
    let source = ts
        .source_with(SourceOptions::new().use_provided_fid())
        .with_transaction(txn.clone());

    let parcel = ts.parcel("residential", 1, 0.0, 0.0).with_id(FeatureId::new("lot-17"));
    let id = source.add_feature(parcel.clone()).unwrap();
    assert_eq!(id.as_str(), "lot-17");
    txn.commit().unwrap();
    assert!(ts.store.fetch(TYPE, &id).unwrap().is_some());

    // without the capability the store assigns its own id
    let plain = ts.source().add_feature(parcel.with_id(FeatureId::new("lot-18"))).unwrap();
    assert!(plain.as_str().starts_with("parcels."));
}

#[test]
fn auto_commit_has_no_lifecycle() {
    let txn = Transaction::AUTO_COMMIT;
    assert_eq!(txn.status(), TransactionStatus::AutoCommit);
    assert!(txn.commit().is_ok());
    assert!(txn.rollback().unwrap_err().is_unsupported());
}
