//! Core types for strata feature sources
//!
//! This crate defines the data model shared by every other crate:
//! - [`Schema`] and [`Feature`]: typed records
//! - [`Filter`] and [`Query`]: read requests
//! - [`Envelope`], [`ReferencedEnvelope`], [`Geometry`]: spatial extents
//! - [`StrataError`]: the error type for all operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod feature;
pub mod filter;
pub mod geometry;
pub mod query;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{StrataError, StrataResult};
pub use feature::{Feature, FeatureBuilder};
pub use filter::{Filter, Predicate};
pub use geometry::{Coord, Crs, Envelope, Geometry, ReferencedEnvelope};
pub use query::{compare_features, Query, SortBy, SortOrder};
pub use schema::{AttributeDescriptor, AttributeType, Schema, SchemaBuilder};
pub use types::{FeatureId, StoreId, TxnId, TypeName, PROVISIONAL_PREFIX};
pub use value::Value;
