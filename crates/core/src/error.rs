//! Error types shared by every strata crate
//!
//! "Unknown" answers (a store that cannot count natively, a transaction
//! state the engine cannot reconcile) are not errors: they are reported as
//! `None` by the operations that can produce them. Querying a type name other
//! than a source's own is not an error either; it yields an empty result.

use crate::types::{FeatureId, TxnId};
use thiserror::Error;

/// All errors produced by the isolation layer and its collaborators.
#[derive(Debug, Error)]
pub enum StrataError {
    /// The source cannot perform the requested operation (e.g. sort order)
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No committed feature with this id exists
    #[error("feature not found: {id}")]
    NotFound {
        /// The id that was looked up
        id: FeatureId,
    },

    /// The store has no schema registered under this type name
    #[error("unknown feature type: {0}")]
    UnknownType(String),

    /// The transaction has already committed or rolled back
    #[error("transaction {txn} is closed")]
    TransactionClosed {
        /// The inert transaction
        txn: TxnId,
    },

    /// Schema definition is malformed
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Backing store failure, propagated unchanged
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for strata operations.
pub type StrataResult<T> = std::result::Result<T, StrataError>;

impl StrataError {
    /// Create a not-found error for a feature id
    pub fn not_found(id: FeatureId) -> Self {
        StrataError::NotFound { id }
    }

    /// Check if this error may succeed on retry
    ///
    /// Store failures are retryable: a failed commit keeps its unapplied
    /// entries staged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StrataError::Storage(_) | StrataError::Io(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::NotFound { .. })
    }

    /// Check if this is an unsupported-operation error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, StrataError::UnsupportedOperation(_))
    }
}
