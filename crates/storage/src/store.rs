//! The backing-store contract
//!
//! The isolation layer never reads or writes records itself; it asks a
//! [`BackingStore`] for native answers over committed state and, at commit
//! time, replays staged writes through the `apply_*` methods.
//!
//! "Cannot answer natively" is `Ok(None)`, not an error. Errors are real
//! failures and are propagated to callers unchanged.

use strata_core::{Feature, FeatureId, Query, ReferencedEnvelope, Schema, StoreId, StrataResult};
use std::sync::Arc;

/// Streaming read over committed features
///
/// Dropping the reader early is always allowed and has no side effects.
pub type FeatureReader = Box<dyn Iterator<Item = StrataResult<Feature>> + Send>;

/// A record store the isolation layer sits in front of
///
/// Queries handed to a store are always *named*: their `type_name` is set to
/// the type being read.
///
/// # Thread Safety
///
/// Stores are shared between sources and transactions and must be
/// `Send + Sync`. Any transactional discipline on the store's own data is the
/// store's responsibility.
pub trait BackingStore: Send + Sync {
    /// Identity used to key per-store transaction state
    fn store_id(&self) -> StoreId;

    /// Schema registered under `type_name`
    ///
    /// # Errors
    /// - `UnknownType` if no such type exists
    fn schema(&self, type_name: &str) -> StrataResult<Arc<Schema>>;

    /// Count committed features matching the query, if the store can do so
    /// without a full read
    fn native_count(&self, query: &Query) -> StrataResult<Option<u64>>;

    /// Bounds of committed features matching the query, if the store can
    /// compute them natively
    fn native_bounds(&self, query: &Query) -> StrataResult<Option<ReferencedEnvelope>>;

    /// Stream committed features matching the query's type and filter
    ///
    /// Row caps, projection and sorting are applied by the caller.
    fn reader(&self, query: &Query) -> StrataResult<FeatureReader>;

    /// Look up one committed feature of `type_name`
    ///
    /// An id stored under another type is `Ok(None)`.
    fn fetch(&self, type_name: &str, id: &FeatureId) -> StrataResult<Option<Feature>>;

    /// Insert a feature, returning the id it is stored under
    ///
    /// With `use_provided_id` the feature's own id is kept (unless it is a
    /// provisional id); otherwise the store assigns one.
    fn apply_insert(&self, feature: Feature, use_provided_id: bool) -> StrataResult<FeatureId>;

    /// Replace a committed feature of the replacement's type
    ///
    /// # Errors
    /// - `NotFound` if no feature of that type has `id`
    fn apply_update(&self, id: &FeatureId, feature: Feature) -> StrataResult<()>;

    /// Delete a committed feature of `type_name`
    ///
    /// # Errors
    /// - `NotFound` if no feature of that type has `id`
    fn apply_delete(&self, type_name: &str, id: &FeatureId) -> StrataResult<()>;
}

impl<S: BackingStore + ?Sized> BackingStore for Arc<S> {
    fn store_id(&self) -> StoreId {
        (**self).store_id()
    }

    fn schema(&self, type_name: &str) -> StrataResult<Arc<Schema>> {
        (**self).schema(type_name)
    }

    fn native_count(&self, query: &Query) -> StrataResult<Option<u64>> {
        (**self).native_count(query)
    }

    fn native_bounds(&self, query: &Query) -> StrataResult<Option<ReferencedEnvelope>> {
        (**self).native_bounds(query)
    }

    fn reader(&self, query: &Query) -> StrataResult<FeatureReader> {
        (**self).reader(query)
    }

    fn fetch(&self, type_name: &str, id: &FeatureId) -> StrataResult<Option<Feature>> {
        (**self).fetch(type_name, id)
    }

    fn apply_insert(&self, feature: Feature, use_provided_id: bool) -> StrataResult<FeatureId> {
        (**self).apply_insert(feature, use_provided_id)
    }

    fn apply_update(&self, id: &FeatureId, feature: Feature) -> StrataResult<()> {
        (**self).apply_update(id, feature)
    }

    fn apply_delete(&self, type_name: &str, id: &FeatureId) -> StrataResult<()> {
        (**self).apply_delete(type_name, id)
    }
}
