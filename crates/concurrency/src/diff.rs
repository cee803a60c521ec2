//! Transaction-local overlay of uncommitted writes
//!
//! A [`Diff`] has two buckets:
//! - `added`: provisional id → staged feature
//! - `modified`: committed id → [`ModifiedEntry`] (a replacement or the
//!   [`Modification::Removed`] marker, plus the committed original)
//!
//! Removal is a modification to the `Removed` marker, so an id is never both
//! replaced and removed: the last write wins. The two key spaces are
//! disjoint because only provisional ids go into `added`.
//!
//! ## Locking
//!
//! Both buckets sit behind one `parking_lot::Mutex`. Every stage operation and
//! every [`Diff::snapshot_read`] takes that lock once, so a reader aggregating
//! over both buckets never sees a writer's half-applied change. Critical
//! sections only touch the maps; no store I/O happens under the lock.
//!
//! ## Settling
//!
//! Commit copies the entries out and applies them without the lock, so
//! writes may be staged while it runs. [`Diff::settle`] then forgets only the
//! entries the store confirmed *as they were applied*; anything staged since
//! survives for the next commit. Once a Diff is [sealed](Diff::seal), every
//! stage operation fails with `TransactionClosed`.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use strata_core::{Feature, FeatureId, StrataError, StrataResult, TxnId};

/// What a transaction did to a committed feature
#[derive(Debug, Clone, PartialEq)]
pub enum Modification {
    /// Replaced with a new value
    Replace(Feature),
    /// Removed
    Removed,
}

impl Modification {
    /// Check if this is the removal marker
    pub fn is_removed(&self) -> bool {
        matches!(self, Modification::Removed)
    }
}

/// A staged change to a committed feature
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedEntry {
    /// The committed feature as it was when first touched by the transaction
    pub original: Feature,
    /// The latest staged change
    pub change: Modification,
}

#[derive(Debug, Clone)]
struct Staged {
    seq: u64,
    feature: Feature,
}

#[derive(Debug, Default)]
struct Buckets {
    added: FxHashMap<FeatureId, Staged>,
    modified: FxHashMap<FeatureId, ModifiedEntry>,
    next_seq: u64,
    sealed: Option<TxnId>,
}

impl Buckets {
    fn writable(&self) -> StrataResult<()> {
        match self.sealed {
            Some(txn) => Err(StrataError::TransactionClosed { txn }),
            None => Ok(()),
        }
    }

    fn push_added(&mut self, id: FeatureId, feature: Feature) {
        let seq = match self.added.get(&id) {
            Some(staged) => staged.seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };
        self.added.insert(id, Staged { seq, feature });
    }
}

/// Read-only view of a [`Diff`], valid only inside [`Diff::snapshot_read`]
#[derive(Debug)]
pub struct DiffView<'a> {
    buckets: &'a Buckets,
}

impl<'a> DiffView<'a> {
    /// Staged additions, in staging order
    pub fn added(&self) -> Vec<&'a Feature> {
        let mut staged: Vec<&Staged> = self.buckets.added.values().collect();
        staged.sort_by_key(|s| s.seq);
        staged.into_iter().map(|s| &s.feature).collect()
    }

    /// Staged changes to committed features (unordered)
    pub fn modified(&self) -> impl Iterator<Item = (&'a FeatureId, &'a ModifiedEntry)> {
        self.buckets.modified.iter()
    }

    /// Staged change for one committed id
    pub fn modification(&self, id: &FeatureId) -> Option<&'a ModifiedEntry> {
        self.buckets.modified.get(id)
    }

    /// Number of staged additions
    pub fn added_len(&self) -> usize {
        self.buckets.added.len()
    }

    /// Number of staged modifications (removals included)
    pub fn modified_len(&self) -> usize {
        self.buckets.modified.len()
    }
}

/// Entries copied out of a [`Diff`] for commit
#[derive(Debug, Clone, Default)]
pub struct DiffEntries {
    /// Modifications, ordered by id
    pub modified: Vec<(FeatureId, ModifiedEntry)>,
    /// Additions, in staging order
    pub added: Vec<(FeatureId, Feature)>,
}

impl DiffEntries {
    /// Check if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty()
    }
}

/// Writes a store confirmed during one commit
#[derive(Debug, Clone, Default)]
pub struct Applied {
    /// Committed id and the change that was applied to it
    pub modified: Vec<(FeatureId, Modification)>,
    /// Staged id, the feature inserted, and the id the store assigned
    pub added: Vec<(FeatureId, Feature, FeatureId)>,
}

impl Applied {
    /// Number of confirmed writes
    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len()
    }

    /// Check if the store confirmed nothing
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.added.is_empty()
    }
}

/// Mutex-guarded overlay of staged writes
#[derive(Debug, Default)]
pub struct Diff {
    buckets: Mutex<Buckets>,
}

impl Diff {
    /// Create an empty diff
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an addition under the feature's own id
    ///
    /// Staging the same id again replaces the earlier feature but keeps its
    /// position in staging order.
    ///
    /// # Errors
    /// - `TransactionClosed` once sealed
    pub fn add(&self, feature: Feature) -> StrataResult<FeatureId> {
        let id = feature.id().clone();
        let mut buckets = self.buckets.lock();
        buckets.writable()?;
        buckets.push_added(id.clone(), feature);
        Ok(id)
    }

    /// Replace a staged addition of the same type
    ///
    /// Returns `Ok(false)` if `id` is not staged.
    ///
    /// # Errors
    /// - `TransactionClosed` once sealed
    /// - `NotFound` if `id` is staged under another type
    pub fn replace_added(&self, id: &FeatureId, feature: Feature) -> StrataResult<bool> {
        let mut buckets = self.buckets.lock();
        buckets.writable()?;
        match buckets.added.get_mut(id) {
            Some(staged) if staged.feature.type_name() == feature.type_name() => {
                staged.feature = feature.with_id(id.clone());
                Ok(true)
            }
            Some(_) => Err(StrataError::not_found(id.clone())),
            None => Ok(false),
        }
    }

    /// Drop a staged addition of `type_name`
    ///
    /// Returns `Ok(false)` if `id` is not staged.
    ///
    /// # Errors
    /// - `TransactionClosed` once sealed
    /// - `NotFound` if `id` is staged under another type
    pub fn remove_added(&self, type_name: &str, id: &FeatureId) -> StrataResult<bool> {
        let mut buckets = self.buckets.lock();
        buckets.writable()?;
        let same_type = buckets
            .added
            .get(id)
            .map(|staged| staged.feature.type_name() == type_name);
        match same_type {
            Some(true) => {
                buckets.added.remove(id);
                Ok(true)
            }
            Some(false) => Err(StrataError::not_found(id.clone())),
            None => Ok(false),
        }
    }

    /// Committed original captured for `id`, if the id was already touched
    pub fn original_of(&self, id: &FeatureId) -> Option<Feature> {
        self.buckets
            .lock()
            .modified
            .get(id)
            .map(|entry| entry.original.clone())
    }

    /// Record a change to a committed feature (last write wins)
    ///
    /// If `id` already has an entry its captured original is kept and
    /// `original` is ignored.
    ///
    /// # Errors
    /// - `TransactionClosed` once sealed
    pub fn modify(
        &self,
        id: FeatureId,
        original: Feature,
        change: Modification,
    ) -> StrataResult<()> {
        let mut buckets = self.buckets.lock();
        buckets.writable()?;
        buckets
            .modified
            .entry(id)
            .and_modify(|entry| entry.change = change.clone())
            .or_insert(ModifiedEntry { original, change });
        Ok(())
    }

    /// Run `visitor` once against a consistent view of both buckets
    ///
    /// The lock is held for the whole visit; keep visitors free of I/O.
    pub fn snapshot_read<R>(&self, visitor: impl FnOnce(&DiffView<'_>) -> R) -> R {
        let buckets = self.buckets.lock();
        let view = DiffView { buckets: &buckets };
        visitor(&view)
    }

    /// Copy every entry out for commit
    pub fn entries(&self) -> DiffEntries {
        self.snapshot_read(|view| {
            let mut modified: Vec<(FeatureId, ModifiedEntry)> = view
                .modified()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect();
            modified.sort_by(|(a, _), (b, _)| a.cmp(b));
            let added = view
                .added()
                .into_iter()
                .map(|f| (f.id().clone(), f.clone()))
                .collect();
            DiffEntries { modified, added }
        })
    }

    /// Forget what a commit applied, keeping anything staged since
    ///
    /// An entry that changed after it was copied out stays staged, rebased
    /// on what the store now holds. A confirmed insert that was edited in the
    /// meantime becomes a modification of its stored id; one that was dropped
    /// becomes a removal.
    pub fn settle(&self, applied: &Applied) {
        let mut buckets = self.buckets.lock();
        for (id, change) in &applied.modified {
            let Some(entry) = buckets.modified.get_mut(id) else {
                continue;
            };
            if entry.change == *change {
                buckets.modified.remove(id);
            } else if let Modification::Replace(stored) = change {
                entry.original = stored.clone();
            }
        }
        for (staged_id, inserted, stored_id) in &applied.added {
            let original = inserted.with_id(stored_id.clone());
            let change = match buckets.added.remove(staged_id) {
                Some(staged) if staged.feature == *inserted => continue,
                Some(staged) => Modification::Replace(staged.feature.with_id(stored_id.clone())),
                None => Modification::Removed,
            };
            buckets
                .modified
                .insert(stored_id.clone(), ModifiedEntry { original, change });
        }
    }

    /// Discard everything
    pub fn clear(&self) {
        let mut buckets = self.buckets.lock();
        buckets.added.clear();
        buckets.modified.clear();
    }

    /// Refuse every later stage operation
    pub fn seal(&self, txn: TxnId) {
        self.buckets.lock().sealed = Some(txn);
    }

    /// Seal only if nothing is staged; returns whether the Diff is sealed
    pub fn seal_if_empty(&self, txn: TxnId) -> bool {
        let mut buckets = self.buckets.lock();
        if buckets.added.is_empty() && buckets.modified.is_empty() {
            buckets.sealed = Some(txn);
            true
        } else {
            false
        }
    }

    /// Accept stage operations again
    pub fn unseal(&self) {
        self.buckets.lock().sealed = None;
    }

    /// Check if stage operations are refused
    pub fn is_sealed(&self) -> bool {
        self.buckets.lock().sealed.is_some()
    }

    /// Check if nothing is staged
    pub fn is_empty(&self) -> bool {
        let buckets = self.buckets.lock();
        buckets.added.is_empty() && buckets.modified.is_empty()
    }

    /// Number of staged entries across both buckets
    pub fn len(&self) -> usize {
        let buckets = self.buckets.lock();
        buckets.added.len() + buckets.modified.len()
    }
}
