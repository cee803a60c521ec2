//! Feature source façade
//!
//! A [`FeatureSource`] serves one feature type from one backing store. Reads
//! see the store's committed state corrected by whatever the bound
//! transaction has staged; writes go straight to the store under
//! auto-commit, or into the transaction's Diff otherwise.
//!
//! ## Desugaring
//!
//! | Façade | Engine / store |
//! |--------|----------------|
//! | `features(q)` | lazy `Reconciler::read(txn, q)` |
//! | `count(q)` | `Reconciler::count(txn, q)` |
//! | `bounds_of(q)` | `Reconciler::bounds(q)` |
//! | `add_feature(f)` | `apply_insert` or `DiffState::stage_add` |
//! | `modify_feature(id, f)` | `apply_update` or `DiffState::stage_modify` |
//! | `remove_feature(id)` | `apply_delete` or `DiffState::stage_remove` |

use crate::capabilities::QueryCapabilities;
use crate::collection::FeatureCollection;
use crate::info::ResourceInfo;
use crate::options::{SourceCapability, SourceOptions};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use strata_concurrency::{DiffState, Transaction, TransactionState};
use strata_core::{
    Feature, FeatureId, Filter, Query, ReferencedEnvelope, Schema, StrataError, StrataResult,
    TypeName,
};
use strata_engine::Reconciler;
use strata_storage::BackingStore;

pub(crate) struct SourceInner {
    store: Arc<dyn BackingStore>,
    schema: Arc<Schema>,
    options: SourceOptions,
    capabilities: QueryCapabilities,
    reconciler: Reconciler,
    info: OnceCell<Arc<ResourceInfo>>,
}

/// Transactional access to one feature type
///
/// Cloning is cheap; clones share the store, schema and resource info but
/// each carries its own transaction binding.
///
/// # Example
///
/// ```ignore
/// use strata_api::{FeatureSource, SourceOptions};
/// use strata_concurrency::Transaction;
///
/// let mut roads = FeatureSource::open(store, "roads", SourceOptions::new())?;
/// let txn = Transaction::begin();
/// roads.set_transaction(txn.clone());
/// roads.add_feature(feature)?;
/// assert_eq!(roads.count(&Query::all())?, Some(1));
/// txn.commit()?;
/// ```
#[derive(Clone)]
pub struct FeatureSource {
    inner: Arc<SourceInner>,
    transaction: Transaction,
}

impl FeatureSource {
    /// Open the source for `type_name` with default options
    pub fn new(store: Arc<dyn BackingStore>, type_name: &str) -> StrataResult<Self> {
        Self::open(store, type_name, SourceOptions::default())
    }

    /// Open the source for `type_name`
    ///
    /// # Errors
    /// - `UnknownType` if the store does not serve `type_name`
    /// - `Config` if `options` declare sorting on an unknown attribute
    pub fn open(
        store: Arc<dyn BackingStore>,
        type_name: &str,
        options: SourceOptions,
    ) -> StrataResult<Self> {
        let schema = store.schema(type_name)?;
        let capabilities = QueryCapabilities::from_declared(&options.capabilities, &schema)?;
        let reconciler = Reconciler::new(Arc::clone(&store), &schema, options.reconciliation);
        tracing::debug!(
            store = %store.store_id(),
            type_name,
            mode = ?options.reconciliation,
            "feature source opened"
        );
        Ok(Self::from_inner(Arc::new(SourceInner {
            store,
            schema,
            options,
            capabilities,
            reconciler,
            info: OnceCell::new(),
        })))
    }

    pub(crate) fn from_inner(inner: Arc<SourceInner>) -> Self {
        FeatureSource {
            inner,
            transaction: Transaction::AUTO_COMMIT,
        }
    }

    // ========================================================================
    // Description
    // ========================================================================

    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// Qualified type name served by this source
    pub fn name(&self) -> &TypeName {
        self.inner.schema.name()
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.inner.store
    }

    pub fn options(&self) -> &SourceOptions {
        &self.inner.options
    }

    pub fn capabilities(&self) -> &QueryCapabilities {
        &self.inner.capabilities
    }

    /// Capabilities this source advertises
    pub fn supported_capabilities(&self) -> Vec<SourceCapability> {
        self.inner.capabilities.declared()
    }

    /// Resource metadata, built on first use
    pub fn info(&self) -> Arc<ResourceInfo> {
        let info = self.inner.info.get_or_init(|| {
            Arc::new(ResourceInfo::new(
                Arc::downgrade(&self.inner),
                &self.inner.schema,
            ))
        });
        Arc::clone(info)
    }

    // ========================================================================
    // Transaction binding
    // ========================================================================

    /// The transaction reads and writes go through
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Bind this source to `txn`
    pub fn set_transaction(&mut self, txn: Transaction) {
        tracing::trace!(type_name = %self.inner.schema.type_name(), txn = ?txn.id(), "transaction bound");
        self.transaction = txn;
    }

    /// A clone of this source bound to `txn`
    pub fn with_transaction(&self, txn: Transaction) -> Self {
        let mut source = self.clone();
        source.set_transaction(txn);
        source
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Features matching `query`
    ///
    /// The collection is lazy: the store is not read until it is iterated.
    /// A query naming another type yields an empty collection.
    ///
    /// # Errors
    /// - `UnsupportedOperation` if the query sorts by an attribute this
    ///   source cannot sort by
    pub fn features(&self, query: &Query) -> StrataResult<FeatureCollection> {
        let own = self.inner.schema.type_name();
        let query = match query.type_name.as_deref() {
            None => query.clone().with_type_name(own),
            Some(name) if name == own => query.clone(),
            Some(other) => {
                tracing::debug!(type_name = own, requested = other, "query for another type");
                return Ok(FeatureCollection::empty(self.projected_schema(query)));
            }
        };

        if !self.inner.capabilities.supports_sorting(&query.sort_by) {
            return Err(StrataError::UnsupportedOperation(format!(
                "{} cannot sort by {:?}",
                own, query.sort_by
            )));
        }

        Ok(FeatureCollection::new(
            self.projected_schema(&query),
            self.inner.reconciler.clone(),
            self.transaction.clone(),
            query,
        ))
    }

    /// Features matching `filter`
    pub fn features_filtered(&self, filter: Filter) -> StrataResult<FeatureCollection> {
        self.features(&Query::filtered(filter))
    }

    /// Every feature
    pub fn all_features(&self) -> StrataResult<FeatureCollection> {
        self.features(&Query::all())
    }

    /// Number of features matching `query`, or `None` if unknown
    pub fn count(&self, query: &Query) -> StrataResult<Option<u64>> {
        self.inner.reconciler.count(&self.transaction, query)
    }

    /// Committed bounds of the whole source
    pub fn bounds(&self) -> StrataResult<Option<ReferencedEnvelope>> {
        self.bounds_of(&Query::all())
    }

    /// Committed bounds of features matching `query`, or `None` if unknown
    pub fn bounds_of(&self, query: &Query) -> StrataResult<Option<ReferencedEnvelope>> {
        self.inner.reconciler.bounds(query)
    }

    fn projected_schema(&self, query: &Query) -> Arc<Schema> {
        match &query.properties {
            Some(names) => Arc::new(self.inner.schema.subset(names)),
            None => Arc::clone(&self.inner.schema),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a feature, returning its id
    ///
    /// Under auto-commit the id is the store's. Inside a transaction it is
    /// the provisional id the feature is staged under, unless this source
    /// honors provided ids and the feature carries one.
    ///
    /// # Errors
    /// - `UnknownType` if the feature is of another type
    /// - `TransactionClosed` if the bound transaction has ended
    pub fn add_feature(&self, feature: Feature) -> StrataResult<FeatureId> {
        self.check_type(&feature)?;
        if self.transaction.is_auto_commit() {
            let id = self
                .inner
                .store
                .apply_insert(feature, self.inner.capabilities.is_use_provided_fid_supported())?;
            tracing::debug!(id = %id, "feature inserted (auto-commit)");
            return Ok(id);
        }
        self.with_diff_state(|state| state.stage_add(feature))
    }

    /// Replace the feature `id` with `feature`
    ///
    /// # Errors
    /// - `NotFound` if `id` is not a feature of this source's type visible
    ///   to the bound transaction
    /// - `UnknownType` if the feature is of another type
    /// - `TransactionClosed` if the bound transaction has ended
    pub fn modify_feature(&self, id: &FeatureId, feature: Feature) -> StrataResult<()> {
        self.check_type(&feature)?;
        if self.transaction.is_auto_commit() {
            self.inner.store.apply_update(id, feature)?;
            tracing::debug!(id = %id, "feature updated (auto-commit)");
            return Ok(());
        }
        self.with_diff_state(|state| state.stage_modify(id, feature))
    }

    /// Remove the feature `id`
    ///
    /// # Errors
    /// - `NotFound` if `id` is not a feature of this source's type visible
    ///   to the bound transaction
    /// - `TransactionClosed` if the bound transaction has ended
    pub fn remove_feature(&self, id: &FeatureId) -> StrataResult<()> {
        let type_name = self.inner.schema.type_name();
        if self.transaction.is_auto_commit() {
            self.inner.store.apply_delete(type_name, id)?;
            tracing::debug!(id = %id, "feature deleted (auto-commit)");
            return Ok(());
        }
        self.with_diff_state(|state| state.stage_remove(type_name, id))
    }

    fn check_type(&self, feature: &Feature) -> StrataResult<()> {
        if feature.type_name() != self.inner.schema.type_name() {
            return Err(StrataError::UnknownType(format!(
                "{} (source serves {})",
                feature.type_name(),
                self.inner.schema.type_name()
            )));
        }
        Ok(())
    }

    /// Run `f` against this store's Diff state, creating it on first write
    fn with_diff_state<R>(
        &self,
        f: impl FnOnce(&DiffState) -> StrataResult<R>,
    ) -> StrataResult<R> {
        let store = Arc::clone(&self.inner.store);
        let use_provided_id = self.inner.capabilities.is_use_provided_fid_supported();
        let state = self
            .transaction
            .state_or_insert_with(store.store_id(), move || -> Arc<dyn TransactionState> {
                Arc::new(DiffState::new(store, use_provided_id))
            })?;
        let diff_state = state.as_diff_state().ok_or_else(|| {
            StrataError::UnsupportedOperation(format!(
                "transaction state {:?} does not stage writes",
                state
            ))
        })?;
        f(diff_state)
    }
}

impl fmt::Debug for FeatureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureSource")
            .field("type_name", &self.inner.schema.type_name())
            .field("store", &self.inner.store.store_id())
            .field("transaction", &self.transaction)
            .finish()
    }
}
