//! Merged reads and bounds through the façade

use crate::common::*;

#[test]
fn read_merges_committed_and_staged() {
    let ts = TestStore::new();
    let committed = ts.seed("residential", 3);

    let source = ts.source().with_transaction(Transaction::begin());
    source.remove_feature(&committed[0]).unwrap();
    source
        .modify_feature(&committed[1], ts.parcel("residential", 999, 1.0, 1.0))
        .unwrap();
    let added = source.add_feature(ts.parcel("residential", 5, 7.0, 7.0)).unwrap();
    assert!(added.is_provisional());

    let features = source.all_features().unwrap().to_vec().unwrap();
    let seen: Vec<&FeatureId> = features.iter().map(Feature::id).collect();
    assert_eq!(seen, vec![&committed[2], &committed[1], &added]);
    assert_eq!(features[1].get("area"), Some(&Value::Int(999)));

    // auto-commit still reads the committed rows untouched
    assert_eq!(ids(&ts.source().all_features().unwrap()), committed);
}

#[test]
fn other_type_query_yields_empty_collection() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source();
    let before = ts.store.read_count();

    let collection = source.features(&Query::named("rivers")).unwrap();
    assert!(collection.is_empty_by_construction());
    assert!(collection.iter().unwrap().next().is_none());
    assert_eq!(collection.size().unwrap(), Some(0));
    assert_eq!(ts.store.read_count(), before);
}

#[test]
fn own_type_name_is_accepted() {
    let ts = TestStore::new();
    ts.seed("residential", 2);
    let source = ts.source();

    assert_eq!(ids(&source.features(&Query::named(TYPE)).unwrap()).len(), 2);
}

#[test]
fn collection_reads_afresh_on_each_iteration() {
    let ts = TestStore::new();
    ts.seed("residential", 1);
    let source = ts.source().with_transaction(Transaction::begin());

    let collection = source.all_features().unwrap();
    let reader = collection.iter().unwrap();
    source.add_feature(ts.parcel("residential", 1, 5.0, 5.0)).unwrap();

    // a reader in flight keeps the snapshot it started with
    assert_eq!(reader.count(), 1);
    assert_eq!(collection.iter().unwrap().count(), 2);
    assert_eq!(collection.size().unwrap(), Some(2));
}

#[test]
fn projection_and_cap_apply_after_merge() {
    let ts = TestStore::new();
    ts.seed("residential", 2);
    let source = ts.source().with_transaction(Transaction::begin());
    source.add_feature(ts.parcel("residential", 7, 5.0, 5.0)).unwrap();

    let query = Query::all().with_properties(["area"]).with_max_features(2);
    let collection = source.features(&query).unwrap();
    assert_eq!(collection.schema().attributes().len(), 1);
    assert_eq!(collection.size().unwrap(), Some(2));

    let rows = collection.to_vec().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|f| f.values().len() == 1 && f.get("zone").is_none()));
}

#[test]
fn bounds_of_exclude_is_empty_with_crs() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source();
    let before = ts.store.read_count();

    let bounds = source
        .bounds_of(&Query::filtered(Filter::Exclude))
        .unwrap()
        .unwrap();
    assert!(bounds.is_empty());
    assert_eq!(bounds.crs(), Some(&Crs::new(CRS)));
    assert_eq!(ts.store.read_count(), before);
}

#[test]
fn bounds_cover_committed_features_only() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source().with_transaction(Transaction::begin());
    source.add_feature(ts.parcel("residential", 1, 50.0, 50.0)).unwrap();

    let bounds = source.bounds().unwrap().unwrap();
    assert_eq!(*bounds.envelope(), Envelope::new(0.0, 0.0, 2.0, 2.0));

    let filtered = source
        .bounds_of(&Query::filtered(Filter::id_in([FeatureId::new("parcels.2")])))
        .unwrap()
        .unwrap();
    assert_eq!(*filtered.envelope(), Envelope::new(1.0, 1.0, 1.0, 1.0));
}

#[test]
fn bounds_unknown_when_store_cannot_compute() {
    let ts = TestStore::with_store(MemoryStore::builder().without_native_bounds().build());
    ts.seed("residential", 1);
    assert!(ts.source().bounds().unwrap().is_none());
}
