//! Storage layer for strata feature sources
//!
//! This crate defines the contract the isolation layer consumes:
//! - [`BackingStore`]: native count/bounds/read plus the write replay used
//!   at commit time
//! - [`MemoryStore`]: sharded in-process reference implementation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod store;

pub use memory::{MemoryStore, MemoryStoreBuilder};
pub use store::{BackingStore, FeatureReader};
