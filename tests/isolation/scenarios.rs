//! Reference scenarios for count reconciliation and capability checks

use crate::common::*;

#[test]
fn scenario_a_adds_and_removal_under_transaction() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 10);
    ts.seed("industrial", 3);

    let txn = Transaction::begin();
    let mut source = ts.source();
    source.set_transaction(txn.clone());

    source.add_feature(ts.parcel("residential", 50, 20.0, 20.0)).unwrap();
    source.add_feature(ts.parcel("residential", 60, 21.0, 21.0)).unwrap();
    source.remove_feature(&committed[0]).unwrap();

    let query = Query::named(TYPE).with_filter(zone("residential"));
    assert_eq!(source.count(&query).unwrap(), Some(11));

    // a second transaction with no staged writes sees the committed count
    let other = ts.source().with_transaction(Transaction::begin());
    assert_eq!(other.count(&query).unwrap(), Some(10));
    assert_eq!(ts.committed(), 13);
}

#[test]
fn scenario_b_unsupported_sort_produces_no_collection() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source_with(SourceOptions::new().sortable("area"));
    let before = ts.store.read_count();

    let result = source.features(&Query::all().with_sort_by(vec![SortBy::asc("zone")]));

    assert!(matches!(result, Err(StrataError::UnsupportedOperation(_))));
    assert_eq!(ts.store.read_count(), before);

    let sorted = source
        .features(&Query::all().with_sort_by(vec![SortBy::desc("area")]))
        .unwrap();
    let areas: Vec<i64> = sorted
        .iter()
        .unwrap()
        .map(|f| f.unwrap().get("area").and_then(Value::as_int).unwrap())
        .collect();
    assert_eq!(areas, vec![102, 101, 100]);
}

#[test]
fn scenario_c_addition_into_empty_match() {
    let ts = TestStore::new();
    ts.seed("industrial", 5);

    let mut source = ts.source();
    source.set_transaction(Transaction::begin());
    source.add_feature(ts.parcel("residential", 10, 9.0, 9.0)).unwrap();

    assert_eq!(
        source.count(&Query::filtered(zone("residential"))).unwrap(),
        Some(1)
    );
    assert_eq!(source.count(&Query::all()).unwrap(), Some(6));
}
