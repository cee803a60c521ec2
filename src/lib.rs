//! # Strata Features
//!
//! Transaction-isolated feature sources over pluggable record stores.
//!
//! Any number of transactions can read and write the same dataset at once.
//! Each one sees the committed state plus its own staged inserts, updates and
//! deletes, and nothing staged by anyone else. The backing store is untouched
//! until commit.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strata_features::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.register_schema(Schema::builder("roads").attribute("name", AttributeType::String).build()?);
//!
//! let mut roads = FeatureSource::new(store, "roads")?;
//! let txn = Transaction::begin();
//! roads.set_transaction(txn.clone());
//!
//! roads.add_feature(road)?;
//! assert_eq!(roads.count(&Query::all())?, Some(1));
//! txn.commit()?;
//! ```
//!
//! ## Layers
//!
//! - [`strata_core`]: features, schemas, filters, queries, errors
//! - [`strata_storage`]: the [`BackingStore`] contract and [`MemoryStore`]
//! - [`strata_concurrency`]: [`Diff`], [`DiffState`], [`Transaction`]
//! - [`strata_engine`]: count/bounds/read reconciliation
//! - [`strata_api`]: the [`FeatureSource`] façade

#![warn(missing_docs)]

pub mod prelude;

pub use strata_api;
pub use strata_concurrency;
pub use strata_core;
pub use strata_engine;
pub use strata_storage;

pub use strata_api::{
    FeatureCollection, FeatureSource, QueryCapabilities, ResourceInfo, SourceCapability,
    SourceOptions,
};
pub use strata_concurrency::{Diff, DiffState, Transaction, TransactionState, TransactionStatus};
pub use strata_core::{StrataError, StrataResult};
pub use strata_engine::ReconciliationMode;
pub use strata_storage::{BackingStore, FeatureReader, MemoryStore};
