//! In-process reference store
//!
//! `MemoryStore` keeps committed features in a `DashMap` keyed by type name,
//! with one `FxHashMap` shard per type, so readers of different types never
//! contend. Natural order is insertion order, tracked with a global sequence
//! number.
//!
//! It exists so the isolation layer can be embedded and tested end to end.
//! Two switches make the store deliberately less capable:
//! - `without_native_count` / `without_native_bounds` make the native
//!   answers unknown
//! - `write_budget` makes the store fail after a number of applied writes

use crate::store::{BackingStore, FeatureReader};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_core::{
    Envelope, Feature, FeatureId, Query, ReferencedEnvelope, Schema, StoreId, StrataError,
    StrataResult,
};

const UNLIMITED: u64 = u64::MAX;

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    feature: Feature,
}

/// Committed features of one type
#[derive(Debug)]
struct Shard {
    schema: Arc<Schema>,
    next_id: u64,
    data: FxHashMap<FeatureId, Row>,
}

impl Shard {
    fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            next_id: 1,
            data: FxHashMap::default(),
        }
    }

    /// Matching rows in insertion order
    fn matching(&self, query: &Query) -> Vec<Row> {
        let mut rows: Vec<Row> = self
            .data
            .values()
            .filter(|row| query.filter.evaluate(&row.feature))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.seq);
        rows
    }
}

/// In-memory [`BackingStore`]
///
/// # Example
///
/// ```ignore
/// use strata_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let schema = store.register_schema(schema)?;
/// let id = store.insert(feature)?;
/// ```
pub struct MemoryStore {
    id: StoreId,
    shards: DashMap<String, Shard>,
    seq: AtomicU64,
    native_count: bool,
    native_bounds: bool,
    write_budget: AtomicU64,
    reads: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store with native count and bounds
    pub fn new() -> Self {
        MemoryStoreBuilder::default().build()
    }

    /// Configure a store
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// Register a feature type
    ///
    /// Registering the same type name again keeps the existing schema and
    /// data.
    pub fn register_schema(&self, schema: Schema) -> Arc<Schema> {
        let type_name = schema.type_name().to_string();
        let shard = self
            .shards
            .entry(type_name)
            .or_insert_with(|| Shard::new(Arc::new(schema)));
        Arc::clone(&shard.schema)
    }

    /// Insert a committed feature directly, bypassing any transaction
    pub fn insert(&self, feature: Feature) -> StrataResult<FeatureId> {
        self.apply_insert(feature, false)
    }

    /// Number of committed features of a type
    pub fn len_of(&self, type_name: &str) -> usize {
        self.shards
            .get(type_name)
            .map(|shard| shard.data.len())
            .unwrap_or(0)
    }

    /// Number of read operations served so far
    ///
    /// Counts `native_count`, `native_bounds`, `reader` and `fetch` calls.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Acquire)
    }

    /// Allow `n` more applied writes before failing, or `None` for no limit
    pub fn set_write_budget(&self, budget: Option<u64>) {
        self.write_budget
            .store(budget.unwrap_or(UNLIMITED), Ordering::Release);
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::AcqRel);
    }

    fn spend_write(&self) -> StrataResult<()> {
        let spent = self
            .write_budget
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            });
        spent
            .map(|_| ())
            .map_err(|_| StrataError::Storage("write budget exhausted".into()))
    }

    fn shard_type(query: &Query) -> StrataResult<&str> {
        query
            .type_name
            .as_deref()
            .ok_or_else(|| StrataError::Internal("store queries must be named".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("id", &self.id)
            .field("types", &self.shards.len())
            .field("native_count", &self.native_count)
            .field("native_bounds", &self.native_bounds)
            .finish()
    }
}

impl BackingStore for MemoryStore {
    fn store_id(&self) -> StoreId {
        self.id
    }

    fn schema(&self, type_name: &str) -> StrataResult<Arc<Schema>> {
        self.shards
            .get(type_name)
            .map(|shard| Arc::clone(&shard.schema))
            .ok_or_else(|| StrataError::UnknownType(type_name.to_string()))
    }

    fn native_count(&self, query: &Query) -> StrataResult<Option<u64>> {
        self.record_read();
        if !self.native_count {
            return Ok(None);
        }
        let type_name = Self::shard_type(query)?;
        let shard = self
            .shards
            .get(type_name)
            .ok_or_else(|| StrataError::UnknownType(type_name.to_string()))?;
        let count = shard
            .data
            .values()
            .filter(|row| query.filter.evaluate(&row.feature))
            .count();
        Ok(Some(count as u64))
    }

    fn native_bounds(&self, query: &Query) -> StrataResult<Option<ReferencedEnvelope>> {
        self.record_read();
        if !self.native_bounds {
            return Ok(None);
        }
        let type_name = Self::shard_type(query)?;
        let shard = self
            .shards
            .get(type_name)
            .ok_or_else(|| StrataError::UnknownType(type_name.to_string()))?;
        let mut envelope = Envelope::empty();
        for row in shard.data.values() {
            if query.filter.evaluate(&row.feature) {
                envelope.expand_to_include_envelope(&row.feature.bounds());
            }
        }
        Ok(Some(ReferencedEnvelope::new(
            envelope,
            shard.schema.crs().cloned(),
        )))
    }

    fn reader(&self, query: &Query) -> StrataResult<FeatureReader> {
        self.record_read();
        let type_name = Self::shard_type(query)?;
        let shard = self
            .shards
            .get(type_name)
            .ok_or_else(|| StrataError::UnknownType(type_name.to_string()))?;
        let rows = shard.matching(query);
        Ok(Box::new(rows.into_iter().map(|row| Ok(row.feature))))
    }

    fn fetch(&self, type_name: &str, id: &FeatureId) -> StrataResult<Option<Feature>> {
        self.record_read();
        Ok(self
            .shards
            .get(type_name)
            .and_then(|shard| shard.data.get(id).map(|row| row.feature.clone())))
    }

    fn apply_insert(&self, feature: Feature, use_provided_id: bool) -> StrataResult<FeatureId> {
        let type_name = feature.type_name().to_string();
        let mut shard = self
            .shards
            .get_mut(&type_name)
            .ok_or_else(|| StrataError::UnknownType(type_name.clone()))?;
        let provided = use_provided_id && !feature.id().is_provisional();
        if provided && shard.data.contains_key(feature.id()) {
            return Err(StrataError::Storage(format!(
                "duplicate feature id {}",
                feature.id()
            )));
        }
        self.spend_write()?;
        let id = if provided {
            feature.id().clone()
        } else {
            let id = FeatureId::new(format!("{}.{}", type_name, shard.next_id));
            shard.next_id += 1;
            id
        };
        let seq = self.seq.fetch_add(1, Ordering::AcqRel);
        shard.data.insert(
            id.clone(),
            Row {
                seq,
                feature: feature.with_id(id.clone()),
            },
        );
        tracing::trace!(store = %self.id, id = %id, "feature inserted");
        Ok(id)
    }

    fn apply_update(&self, id: &FeatureId, feature: Feature) -> StrataResult<()> {
        let mut shard = self
            .shards
            .get_mut(feature.type_name())
            .ok_or_else(|| StrataError::not_found(id.clone()))?;
        if !shard.data.contains_key(id) {
            return Err(StrataError::not_found(id.clone()));
        }
        self.spend_write()?;
        if let Some(row) = shard.data.get_mut(id) {
            row.feature = feature.with_id(id.clone());
        }
        tracing::trace!(store = %self.id, id = %id, "feature updated");
        Ok(())
    }

    fn apply_delete(&self, type_name: &str, id: &FeatureId) -> StrataResult<()> {
        let mut shard = self
            .shards
            .get_mut(type_name)
            .ok_or_else(|| StrataError::not_found(id.clone()))?;
        if !shard.data.contains_key(id) {
            return Err(StrataError::not_found(id.clone()));
        }
        self.spend_write()?;
        shard.data.remove(id);
        tracing::trace!(store = %self.id, id = %id, "feature deleted");
        Ok(())
    }
}

/// Builder for [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryStoreBuilder {
    native_count: bool,
    native_bounds: bool,
    write_budget: Option<u64>,
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self {
            native_count: true,
            native_bounds: true,
            write_budget: None,
        }
    }
}

impl MemoryStoreBuilder {
    /// Report native counts as unknown
    pub fn without_native_count(mut self) -> Self {
        self.native_count = false;
        self
    }

    /// Report native bounds as unknown
    pub fn without_native_bounds(mut self) -> Self {
        self.native_bounds = false;
        self
    }

    /// Fail every write after `n` successful ones
    pub fn write_budget(mut self, n: u64) -> Self {
        self.write_budget = Some(n);
        self
    }

    /// Build the store
    pub fn build(self) -> MemoryStore {
        MemoryStore {
            id: StoreId::new(),
            shards: DashMap::new(),
            seq: AtomicU64::new(0),
            native_count: self.native_count,
            native_bounds: self.native_bounds,
            write_budget: AtomicU64::new(self.write_budget.unwrap_or(UNLIMITED)),
            reads: AtomicU64::new(0),
        }
    }
}
