//! Shared fixtures for integration tests
//!
//! `TestStore` wraps a `MemoryStore` with a `parcels` schema registered.
//! Parcels carry a `zone` (string), an `area` (int) and a point geometry in
//! EPSG:4326.

#![allow(dead_code)]

pub use std::sync::Arc;
pub use strata_features::prelude::*;

pub const TYPE: &str = "parcels";
pub const CRS: &str = "EPSG:4326";

pub fn parcels_schema() -> Schema {
    Schema::builder(TYPE)
        .namespace("http://example.org/cadastre")
        .attribute("zone", AttributeType::String)
        .attribute("area", AttributeType::Int)
        .geometry("geom", Some(Crs::new(CRS)))
        .build()
        .unwrap()
}

/// Install a test-writer subscriber once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub struct TestStore {
    pub store: Arc<MemoryStore>,
    pub schema: Arc<Schema>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        init_tracing();
        let store = Arc::new(store);
        let schema = store.register_schema(parcels_schema());
        TestStore { store, schema }
    }

    pub fn parcel(&self, zone: &str, area: i64, x: f64, y: f64) -> Feature {
        Feature::builder(Arc::clone(&self.schema))
            .set("zone", zone)
            .set("area", area)
            .set("geom", Geometry::point(x, y))
            .build()
            .unwrap()
    }

    /// Commit `n` parcels in `zone`, at x = 0, 1, 2, ...
    pub fn seed(&self, zone: &str, n: usize) -> Vec<FeatureId> {
        (0..n)
            .map(|i| {
                self.store
                    .insert(self.parcel(zone, 100 + i as i64, i as f64, i as f64))
                    .unwrap()
            })
            .collect()
    }

    pub fn source(&self) -> FeatureSource {
        FeatureSource::new(self.store.clone(), TYPE).unwrap()
    }

    pub fn source_with(&self, options: SourceOptions) -> FeatureSource {
        FeatureSource::open(self.store.clone(), TYPE, options).unwrap()
    }

    pub fn committed(&self) -> usize {
        self.store.len_of(TYPE)
    }
}

pub fn zone(name: &str) -> Filter {
    Filter::property_eq("zone", name)
}

pub fn ids(collection: &FeatureCollection) -> Vec<FeatureId> {
    collection
        .iter()
        .unwrap()
        .map(|f| f.unwrap().id().clone())
        .collect()
}
