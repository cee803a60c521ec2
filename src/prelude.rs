//! Convenient imports for strata feature sources.
//!
//! ```ignore
//! use strata_features::prelude::*;
//! ```

// Entry points
pub use crate::{FeatureCollection, FeatureSource, SourceCapability, SourceOptions};

// Transactions
pub use crate::{DiffState, ReconciliationMode, Transaction, TransactionState, TransactionStatus};

// Stores
pub use crate::{BackingStore, MemoryStore};

// Error handling
pub use crate::{StrataError, StrataResult};

// Core types
pub use strata_core::{
    AttributeType, Crs, Envelope, Feature, FeatureId, Filter, Geometry, Query,
    ReferencedEnvelope, Schema, SortBy, Value,
};

pub use std::sync::Arc;
