//! Public API for strata feature sources
//!
//! [`FeatureSource`] is the entry point: it serves one feature type from a
//! [`BackingStore`](strata_storage::BackingStore), reconciling reads against
//! the staged writes of whatever [`Transaction`](strata_concurrency::Transaction)
//! it is bound to.

#![warn(clippy::all)]

pub mod capabilities;
pub mod collection;
pub mod info;
pub mod options;
pub mod source;

pub use capabilities::QueryCapabilities;
pub use collection::FeatureCollection;
pub use info::ResourceInfo;
pub use options::{SourceCapability, SourceOptions};
pub use source::FeatureSource;
pub use strata_engine::ReconciliationMode;
