//! Query reconciliation
//!
//! Every read answers from three sources: the store's committed state, the
//! active transaction's Diff, and the query filter. The [`Reconciler`] asks the
//! store for a native answer and corrects it with the Diff.
//!
//! ## count
//!
//! ```text
//! 1. filter == Exclude            → 0 (no store access)
//! 2. native = store.native_count  → unknown if the store cannot count
//! 3. auto-commit                  → native
//! 4. no state for this store      → native
//! 5. state is not a DiffState     → unknown
//! 6. native + delta(Diff)         (one lock scope over both buckets)
//! ```
//!
//! ## bounds
//!
//! `Exclude` yields an empty envelope in the schema's CRS; everything else is
//! the store's native bounds. Staged writes never widen the envelope.

use crate::mode::ReconciliationMode;
use crate::reader::{finish, DiffMergeReader};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use strata_concurrency::{DiffView, Modification, Transaction};
use strata_core::{Crs, Feature, FeatureId, Filter, Query, ReferencedEnvelope, Schema, StrataResult};
use strata_storage::{BackingStore, FeatureReader};

/// Reconciles reads of one feature type against one store
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn BackingStore>,
    type_name: String,
    crs: Option<Crs>,
    mode: ReconciliationMode,
}

impl Reconciler {
    /// Create a reconciler for `schema`'s type in `store`
    pub fn new(store: Arc<dyn BackingStore>, schema: &Schema, mode: ReconciliationMode) -> Self {
        Reconciler {
            store,
            type_name: schema.type_name().to_string(),
            crs: schema.crs().cloned(),
            mode,
        }
    }

    /// The store being read
    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Active reconciliation mode
    pub fn mode(&self) -> ReconciliationMode {
        self.mode
    }

    /// The query re-targeted at this reconciler's type
    pub fn named(&self, query: &Query) -> Query {
        query.retarget(&self.type_name)
    }

    /// Count features visible to `txn`
    ///
    /// Returns `Ok(None)` when the answer is unknown.
    pub fn count(&self, txn: &Transaction, query: &Query) -> StrataResult<Option<u64>> {
        if query.filter.is_exclude() {
            return Ok(Some(0));
        }

        let named = self.named(query);
        let Some(native) = self.store.native_count(&named)? else {
            return Ok(None);
        };

        if txn.is_auto_commit() {
            return Ok(Some(native));
        }
        let Some(state) = txn.state(self.store.store_id()) else {
            return Ok(Some(native));
        };
        let Some(diff_state) = state.as_diff_state() else {
            tracing::warn!(
                txn = ?txn.id(),
                state = ?state,
                "transaction state cannot be reconciled; count unknown"
            );
            return Ok(None);
        };

        let delta = diff_state
            .diff()
            .snapshot_read(|view| self.delta(view, &named.filter));
        let total = (native as i64).saturating_add(delta).max(0) as u64;
        tracing::trace!(
            type_name = %self.type_name,
            handle = ?query.handle,
            native,
            delta,
            total,
            "count reconciled"
        );
        Ok(Some(total))
    }

    /// Count adjustment implied by a Diff
    fn delta(&self, view: &DiffView<'_>, filter: &Filter) -> i64 {
        let mut delta = 0i64;
        for feature in view.added() {
            if self.is_own(feature) && filter.evaluate(feature) {
                delta += 1;
            }
        }
        for (_, entry) in view.modified() {
            if !self.is_own(&entry.original) {
                continue;
            }
            match &entry.change {
                Modification::Removed => {
                    if filter.evaluate(&entry.original) {
                        delta -= 1;
                    }
                }
                Modification::Replace(feature) if self.mode.counts_replacements() => {
                    delta += i64::from(filter.evaluate(feature));
                    delta -= i64::from(filter.evaluate(&entry.original));
                }
                Modification::Replace(_) => {}
            }
        }
        delta
    }

    /// Bounds of committed features matching the query
    ///
    /// Returns `Ok(None)` when the store cannot compute bounds natively.
    pub fn bounds(&self, query: &Query) -> StrataResult<Option<ReferencedEnvelope>> {
        if query.filter.is_exclude() {
            return Ok(Some(ReferencedEnvelope::empty(self.crs.clone())));
        }
        self.store.native_bounds(&self.named(query))
    }

    /// Stream features visible to `txn`
    ///
    /// Staged writes are merged in when the transaction holds a Diff for this
    /// store; a state of any other kind reads committed features only.
    pub fn read(&self, txn: &Transaction, query: &Query) -> StrataResult<FeatureReader> {
        let named = self.named(query);
        if named.filter.is_exclude() {
            return Ok(Box::new(std::iter::empty()));
        }

        let state = if txn.is_auto_commit() {
            None
        } else {
            txn.state(self.store.store_id())
        };
        // cap, sort and projection apply to the merged stream
        let native = Query {
            max_features: None,
            properties: None,
            sort_by: Vec::new(),
            ..named.clone()
        };
        let committed = self.store.reader(&native)?;

        let diff_state = state.as_deref().and_then(|s| s.as_diff_state());
        let reader: FeatureReader = match diff_state {
            Some(diff_state) => {
                let (skip, pending) = diff_state
                    .diff()
                    .snapshot_read(|view| self.staged(view, &named.filter));
                Box::new(DiffMergeReader::new(committed, skip, pending))
            }
            None => committed,
        };
        Ok(finish(reader, &named))
    }

    /// Touched committed ids, plus staged features matching `filter`
    fn staged(
        &self,
        view: &DiffView<'_>,
        filter: &Filter,
    ) -> (FxHashSet<FeatureId>, Vec<Feature>) {
        let mut skip = FxHashSet::default();
        let mut pending = Vec::new();
        let mut replaced: Vec<&Feature> = Vec::new();
        for (id, entry) in view.modified() {
            if !self.is_own(&entry.original) {
                continue;
            }
            skip.insert(id.clone());
            if let Modification::Replace(feature) = &entry.change {
                if filter.evaluate(feature) {
                    replaced.push(feature);
                }
            }
        }
        replaced.sort_by(|a, b| a.id().cmp(b.id()));
        pending.extend(replaced.into_iter().cloned());
        pending.extend(
            view.added()
                .into_iter()
                .filter(|f| self.is_own(f) && filter.evaluate(f))
                .cloned(),
        );
        (skip, pending)
    }

    fn is_own(&self, feature: &Feature) -> bool {
        feature.type_name() == self.type_name
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store.store_id())
            .field("type_name", &self.type_name)
            .field("mode", &self.mode)
            .finish()
    }
}
