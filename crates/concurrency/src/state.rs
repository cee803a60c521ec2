//! Per-store transaction state
//!
//! A transaction keeps one [`TransactionState`] per backing store it has
//! written to. The isolation strategy implemented here is [`DiffState`]: all
//! writes are staged in a [`Diff`] and replayed against the store on commit.
//! Other strategies can implement the trait; the reconciliation engine only
//! knows how to correct reads for `DiffState` and reports unknown otherwise.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Acquire commit lock (one commit of this Diff at a time)
//! 2. Copy entries out of the Diff (Diff lock held only for the copy)
//! 3. Apply modifications: update or delete
//! 4. Apply additions: insert
//! 5. Settle: forget what the store confirmed, keep anything staged since
//! 6. On failure, return the error; unconfirmed entries stay for a retry
//! ```
//!
//! A failed commit can be retried; it resumes with the entries the store
//! never confirmed. Writes the store did confirm are not rolled back.
//!
//! Stage calls racing a commit are never lost: they either landed before the
//! copy and were applied, or they stay in the Diff. The owning transaction
//! [closes](TransactionState::close) each state once it is drained, after
//! which staging fails with `TransactionClosed`.

use crate::diff::{Applied, Diff, DiffEntries, Modification};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use strata_core::{Feature, FeatureId, StrataError, StrataResult, TxnId};
use strata_storage::BackingStore;

/// The binding of one isolation strategy to one (store, transaction) pair
pub trait TransactionState: Send + Sync + fmt::Debug {
    /// Make staged writes durable in the store
    fn commit(&self) -> StrataResult<()>;

    /// Discard staged writes without touching the store
    fn rollback(&self) -> StrataResult<()>;

    /// Refuse further writes if nothing is pending
    ///
    /// Returns false when writes were staged after the last commit; the
    /// caller commits again before retrying.
    fn close(&self, _txn: TxnId) -> bool {
        true
    }

    /// Refuse further writes unconditionally
    fn seal(&self, _txn: TxnId) {}

    /// Accept writes again after a commit that did not finish
    fn reopen(&self) {}

    /// Downcast to the Diff-based strategy
    fn as_diff_state(&self) -> Option<&DiffState> {
        None
    }
}

/// Diff-backed transaction state
///
/// # Thread Safety
///
/// Stage operations may run from any number of threads. Store I/O
/// (fetching originals, commit) always happens outside the Diff lock.
pub struct DiffState {
    store: Arc<dyn BackingStore>,
    diff: Diff,
    use_provided_id: bool,
    /// Serializes commits so a Diff is never applied twice concurrently
    commit_lock: Mutex<()>,
}

impl DiffState {
    /// Create an empty state for `store`
    ///
    /// With `use_provided_id`, staged additions keep their own ids and the
    /// store is asked to keep them on insert.
    pub fn new(store: Arc<dyn BackingStore>, use_provided_id: bool) -> Self {
        DiffState {
            store,
            diff: Diff::new(),
            use_provided_id,
            commit_lock: Mutex::new(()),
        }
    }

    /// The overlay
    pub fn diff(&self) -> &Diff {
        &self.diff
    }

    /// Stage an insert, returning the id it is staged under
    ///
    /// # Errors
    /// - `TransactionClosed` once the owning transaction has finished
    pub fn stage_add(&self, feature: Feature) -> StrataResult<FeatureId> {
        let feature = if self.use_provided_id && !feature.id().is_provisional() {
            feature
        } else {
            feature.with_id(FeatureId::provisional())
        };
        let id = self.diff.add(feature)?;
        tracing::trace!(id = %id, "staged add");
        Ok(id)
    }

    /// Stage a replacement
    ///
    /// Only a feature of the replacement's own type can be replaced.
    ///
    /// # Errors
    /// - `NotFound` if `id` is neither staged nor committed as that type
    /// - `TransactionClosed` once the owning transaction has finished
    pub fn stage_modify(&self, id: &FeatureId, feature: Feature) -> StrataResult<()> {
        if self.diff.replace_added(id, feature.clone())? {
            tracing::trace!(id = %id, "staged modify of pending add");
            return Ok(());
        }
        let original = self.original(feature.type_name(), id)?;
        self.diff.modify(
            id.clone(),
            original,
            Modification::Replace(feature.with_id(id.clone())),
        )?;
        tracing::trace!(id = %id, "staged modify");
        Ok(())
    }

    /// Stage a removal of a `type_name` feature
    ///
    /// # Errors
    /// - `NotFound` if `id` is neither staged nor committed as that type
    /// - `TransactionClosed` once the owning transaction has finished
    pub fn stage_remove(&self, type_name: &str, id: &FeatureId) -> StrataResult<()> {
        if self.diff.remove_added(type_name, id)? {
            tracing::trace!(id = %id, "dropped pending add");
            return Ok(());
        }
        let original = self.original(type_name, id)?;
        self.diff.modify(id.clone(), original, Modification::Removed)?;
        tracing::trace!(id = %id, "staged remove");
        Ok(())
    }

    /// Committed original of `id`, from the Diff if captured, else the store
    fn original(&self, type_name: &str, id: &FeatureId) -> StrataResult<Feature> {
        if id.is_provisional() {
            return Err(StrataError::not_found(id.clone()));
        }
        let original = match self.diff.original_of(id) {
            Some(original) => Some(original),
            None => self.store.fetch(type_name, id)?,
        };
        original
            .filter(|f| f.type_name() == type_name)
            .ok_or_else(|| StrataError::not_found(id.clone()))
    }

    /// Replay entries against the store, recording each confirmed write
    fn apply(&self, entries: DiffEntries, applied: &mut Applied) -> StrataResult<()> {
        for (id, entry) in entries.modified {
            match &entry.change {
                Modification::Replace(feature) => self.store.apply_update(&id, feature.clone())?,
                Modification::Removed => self.store.apply_delete(entry.original.type_name(), &id)?,
            }
            applied.modified.push((id, entry.change));
        }
        for (id, feature) in entries.added {
            let stored = self.store.apply_insert(feature.clone(), self.use_provided_id)?;
            tracing::trace!(provisional = %id, stored = %stored, "insert applied");
            applied.added.push((id, feature, stored));
        }
        Ok(())
    }
}

impl fmt::Debug for DiffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffState")
            .field("store", &self.store.store_id())
            .field("staged", &self.diff.len())
            .field("use_provided_id", &self.use_provided_id)
            .field("sealed", &self.diff.is_sealed())
            .finish()
    }
}

impl TransactionState for DiffState {
    fn commit(&self) -> StrataResult<()> {
        let _commit_guard = self.commit_lock.lock();

        let entries = self.diff.entries();
        if entries.is_empty() {
            return Ok(());
        }

        let mut applied = Applied::default();
        let result = self.apply(entries, &mut applied);
        self.diff.settle(&applied);

        match result {
            Ok(()) => {
                tracing::debug!(
                    store = %self.store.store_id(),
                    modified = applied.modified.len(),
                    added = applied.added.len(),
                    pending = self.diff.len(),
                    "diff committed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    store = %self.store.store_id(),
                    applied = applied.len(),
                    remaining = self.diff.len(),
                    error = %e,
                    "diff commit failed; unapplied entries kept for retry"
                );
                Err(e)
            }
        }
    }

    fn rollback(&self) -> StrataResult<()> {
        let _commit_guard = self.commit_lock.lock();
        let discarded = self.diff.len();
        self.diff.clear();
        tracing::debug!(store = %self.store.store_id(), discarded, "diff rolled back");
        Ok(())
    }

    fn close(&self, txn: TxnId) -> bool {
        let _commit_guard = self.commit_lock.lock();
        self.diff.seal_if_empty(txn)
    }

    fn seal(&self, txn: TxnId) {
        self.diff.seal(txn);
    }

    fn reopen(&self) {
        self.diff.unseal();
    }

    fn as_diff_state(&self) -> Option<&DiffState> {
        Some(self)
    }
}
