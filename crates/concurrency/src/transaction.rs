//! Transaction handles
//!
//! A [`Transaction`] is a cheap, clonable session handle. The reserved
//! [`Transaction::AUTO_COMMIT`] value bypasses isolation: it never holds
//! state, and writes made under it go straight to the store.
//!
//! An active transaction holds at most one [`TransactionState`] per backing
//! store, created lazily on the first write to that store.
//!
//! ## Lifecycle
//!
//! ```text
//! Active ──commit()──▶ Committed
//!    │
//!    └──rollback()──▶ RolledBack
//! ```
//!
//! Both terminal states are inert: no new state can be attached and a second
//! commit or rollback fails with `TransactionClosed`. A commit that fails
//! leaves the transaction `Active` so it can be retried. Each store commits
//! independently; there is no cross-store atomicity.

use crate::state::TransactionState;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use strata_core::{StoreId, StrataError, StrataResult, TxnId};

/// Lifecycle position of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// The auto-commit handle (never changes)
    AutoCommit,
    /// Accepting writes
    Active,
    /// All per-store states committed
    Committed,
    /// All per-store states rolled back
    RolledBack,
}

struct TxnInner {
    id: TxnId,
    handle: Option<String>,
    status: Mutex<TransactionStatus>,
    states: Mutex<FxHashMap<StoreId, Arc<dyn TransactionState>>>,
}

/// Session handle shared by every source taking part in a transaction
///
/// Clones refer to the same transaction; equality is identity.
#[derive(Clone)]
pub struct Transaction {
    inner: Option<Arc<TxnInner>>,
}

impl Transaction {
    /// The auto-commit handle
    pub const AUTO_COMMIT: Transaction = Transaction { inner: None };

    /// Begin a new transaction
    pub fn begin() -> Self {
        Self::begin_with(None)
    }

    /// Begin a new transaction labelled for diagnostics
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self::begin_with(Some(handle.into()))
    }

    fn begin_with(handle: Option<String>) -> Self {
        let inner = TxnInner {
            id: TxnId::new(),
            handle,
            status: Mutex::new(TransactionStatus::Active),
            states: Mutex::new(FxHashMap::default()),
        };
        tracing::debug!(txn = %inner.id, handle = ?inner.handle, "transaction begun");
        Transaction {
            inner: Some(Arc::new(inner)),
        }
    }

    /// Check if this is the auto-commit handle
    pub fn is_auto_commit(&self) -> bool {
        self.inner.is_none()
    }

    /// Transaction id (`None` for auto-commit)
    pub fn id(&self) -> Option<TxnId> {
        self.inner.as_ref().map(|inner| inner.id)
    }

    /// Diagnostics label, if any
    pub fn handle(&self) -> Option<&str> {
        self.inner.as_ref().and_then(|inner| inner.handle.as_deref())
    }

    /// Current lifecycle position
    pub fn status(&self) -> TransactionStatus {
        match &self.inner {
            None => TransactionStatus::AutoCommit,
            Some(inner) => *inner.status.lock(),
        }
    }

    /// State attached for `store`, if this transaction has written to it
    pub fn state(&self, store: StoreId) -> Option<Arc<dyn TransactionState>> {
        let inner = self.inner.as_ref()?;
        let states = inner.states.lock();
        states.get(&store).cloned()
    }

    /// State attached for `store`, creating it with `init` on first use
    ///
    /// # Errors
    /// - `UnsupportedOperation` on the auto-commit handle
    /// - `TransactionClosed` after commit or rollback
    pub fn state_or_insert_with<F>(
        &self,
        store: StoreId,
        init: F,
    ) -> StrataResult<Arc<dyn TransactionState>>
    where
        F: FnOnce() -> Arc<dyn TransactionState>,
    {
        let inner = self.active()?;
        let status = inner.status.lock();
        if *status != TransactionStatus::Active {
            return Err(StrataError::TransactionClosed { txn: inner.id });
        }
        let mut states = inner.states.lock();
        let state = states.entry(store).or_insert_with(|| {
            tracing::debug!(txn = %inner.id, store = %store, "transaction state created");
            init()
        });
        Ok(Arc::clone(state))
    }

    /// Attach a state for `store`, replacing any previous one
    ///
    /// # Errors
    /// - `UnsupportedOperation` on the auto-commit handle
    /// - `TransactionClosed` after commit or rollback
    pub fn put_state(&self, store: StoreId, state: Arc<dyn TransactionState>) -> StrataResult<()> {
        let inner = self.active()?;
        let status = inner.status.lock();
        if *status != TransactionStatus::Active {
            return Err(StrataError::TransactionClosed { txn: inner.id });
        }
        inner.states.lock().insert(store, state);
        Ok(())
    }

    /// Commit every per-store state
    ///
    /// Auto-commit has nothing to commit and succeeds trivially. On the first
    /// store failure the error is returned unchanged and the transaction stays
    /// active, keeping whatever that store did not confirm.
    ///
    /// Each state is closed once drained; a state that picked up writes while
    /// committing is committed again first. Holders of a closed state get
    /// `TransactionClosed` when they try to stage.
    ///
    /// # Errors
    /// - `TransactionClosed` after commit or rollback
    /// - any error from a store, verbatim
    pub fn commit(&self) -> StrataResult<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        let mut status = inner.status.lock();
        if *status != TransactionStatus::Active {
            return Err(StrataError::TransactionClosed { txn: inner.id });
        }
        let states: Vec<(StoreId, Arc<dyn TransactionState>)> = inner
            .states
            .lock()
            .iter()
            .map(|(id, state)| (*id, Arc::clone(state)))
            .collect();

        for (store, state) in &states {
            if let Err(e) = state.commit() {
                tracing::error!(txn = %inner.id, store = %store, error = %e, "commit failed");
                return Err(e);
            }
        }

        // writes staged while committing are committed before the state closes
        let mut closed: Vec<&Arc<dyn TransactionState>> = Vec::with_capacity(states.len());
        for (store, state) in &states {
            while !state.close(inner.id) {
                tracing::debug!(
                    txn = %inner.id,
                    store = %store,
                    "writes staged during commit; committing again"
                );
                if let Err(e) = state.commit() {
                    tracing::error!(txn = %inner.id, store = %store, error = %e, "commit failed");
                    for state in closed {
                        state.reopen();
                    }
                    return Err(e);
                }
            }
            closed.push(state);
        }

        inner.states.lock().clear();
        *status = TransactionStatus::Committed;
        tracing::debug!(txn = %inner.id, stores = states.len(), "transaction committed");
        Ok(())
    }

    /// Roll back every per-store state
    ///
    /// Every state is rolled back even if one fails; the first error is
    /// returned and the transaction is closed regardless.
    ///
    /// # Errors
    /// - `UnsupportedOperation` on the auto-commit handle
    /// - `TransactionClosed` after commit or rollback
    pub fn rollback(&self) -> StrataResult<()> {
        let inner = self.active()?;
        let mut status = inner.status.lock();
        if *status != TransactionStatus::Active {
            return Err(StrataError::TransactionClosed { txn: inner.id });
        }
        let states: Vec<Arc<dyn TransactionState>> =
            inner.states.lock().drain().map(|(_, state)| state).collect();

        let mut first_error = None;
        for state in &states {
            state.seal(inner.id);
            if let Err(e) = state.rollback() {
                tracing::error!(txn = %inner.id, error = %e, "rollback failed");
                first_error.get_or_insert(e);
            }
        }

        *status = TransactionStatus::RolledBack;
        tracing::debug!(txn = %inner.id, stores = states.len(), "transaction rolled back");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn active(&self) -> StrataResult<&TxnInner> {
        self.inner.as_deref().ok_or_else(|| {
            StrataError::UnsupportedOperation("auto-commit transactions hold no state".into())
        })
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Transaction::AUTO_COMMIT
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Transaction {}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("Transaction(AUTO_COMMIT)"),
            Some(inner) => f
                .debug_struct("Transaction")
                .field("id", &inner.id)
                .field("handle", &inner.handle)
                .field("status", &*inner.status.lock())
                .finish(),
        }
    }
}
