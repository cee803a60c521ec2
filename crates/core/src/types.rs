//! Identifier types
//!
//! - [`FeatureId`]: identifies one feature within a store
//! - [`TypeName`]: qualified name of a feature type
//! - [`StoreId`]: identifies one backing store instance
//! - [`TxnId`]: identifies one transaction (diagnostics only)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Prefix reserved for provisional (transaction-local) feature ids
pub const PROVISIONAL_PREFIX: &str = "new";

/// Identifier of a feature
///
/// Committed features carry ids assigned by the backing store. Features
/// staged for insertion inside a transaction carry *provisional* ids, minted
/// with the reserved `new` prefix, until the transaction commits and the store
/// assigns the real one.
///
/// # Examples
///
/// ```
/// use strata_core::FeatureId;
///
/// let committed = FeatureId::new("roads.1");
/// let staged = FeatureId::provisional();
/// assert!(!committed.is_provisional());
/// assert!(staged.is_provisional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(Arc<str>);

impl FeatureId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        FeatureId(id.into())
    }

    /// Mint a fresh provisional identifier
    pub fn provisional() -> Self {
        FeatureId(format!("{}{}", PROVISIONAL_PREFIX, Uuid::new_v4().simple()).into())
    }

    /// Check if this id was minted for a not-yet-committed insert
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::new(s)
    }
}

/// Qualified name of a feature type
///
/// The namespace is optional; the local part is the type name used in
/// queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName {
    /// Namespace URI, if any
    pub namespace: Option<String>,
    /// Local part (the plain type name)
    pub local: String,
}

impl TypeName {
    /// Create a qualified name
    pub fn new(namespace: Option<String>, local: impl Into<String>) -> Self {
        TypeName {
            namespace,
            local: local.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}:{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Unique identifier for a backing store instance
///
/// Transactions key their per-store state by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Create a new random StoreId
    pub fn new() -> Self {
        StoreId(Uuid::new_v4())
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxnId(Uuid);

impl TxnId {
    /// Create a new random TxnId
    pub fn new() -> Self {
        TxnId(Uuid::new_v4())
    }
}

impl Default for TxnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisional_ids_are_unique() {
        let a = FeatureId::provisional();
        let b = FeatureId::provisional();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("new"));
    }

    #[test]
    fn test_store_assigned_ids_are_not_provisional() {
        assert!(!FeatureId::new("roads.17").is_provisional());
    }

    #[test]
    fn test_type_name_display() {
        let plain = TypeName::new(None, "roads");
        let qualified = TypeName::new(Some("http://example.org/ns".into()), "roads");
        assert_eq!(plain.to_string(), "roads");
        assert_eq!(qualified.to_string(), "http://example.org/ns:roads");
    }

    #[test]
    fn test_store_ids_are_unique() {
        assert_ne!(StoreId::new(), StoreId::new());
        assert_ne!(TxnId::new(), TxnId::new());
    }
}
