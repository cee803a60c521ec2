//! Resource metadata

use crate::common::*;

#[test]
fn info_describes_source() {
    let ts = TestStore::new();
    ts.seed("residential", 3);
    let source = ts.source();

    let info = source.info();
    assert_eq!(info.name(), TYPE);
    assert_eq!(info.title(), TYPE);
    assert!(info.keywords().iter().any(|k| k == "features"));
    assert!(info.keywords().iter().any(|k| k == TYPE));
    assert_eq!(info.crs(), Some(&Crs::new(CRS)));
    assert_eq!(info.schema_uri(), Some("http://example.org/cadastre"));

    let bounds = info.bounds().unwrap();
    assert_eq!(*bounds.envelope(), Envelope::new(0.0, 0.0, 2.0, 2.0));
}

#[test]
fn info_bounds_are_best_effort() {
    let ts = TestStore::with_store(MemoryStore::builder().without_native_bounds().build());
    ts.seed("residential", 1);
    assert!(ts.source().info().bounds().is_none());
}

#[test]
fn info_does_not_keep_source_alive() {
    let ts = TestStore::new();
    let info = {
        let source = ts.source();
        assert!(source.info().source().is_some());
        source.info()
    };

    assert!(info.source().is_none());
    assert!(info.bounds().is_none());
    assert_eq!(info.name(), TYPE);
}
