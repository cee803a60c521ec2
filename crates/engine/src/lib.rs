//! Reconciliation engine for strata feature sources
//!
//! Answers count, bounds and feature reads by combining a store's native
//! answer with the staged writes of the active transaction.
//!
//! - [`Reconciler`]: count/bounds/read for one feature type in one store
//! - [`DiffMergeReader`]: committed stream corrected by a Diff snapshot
//! - [`ReconciliationMode`]: how replacements affect counts

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mode;
pub mod reader;
pub mod reconcile;

pub use mode::ReconciliationMode;
pub use reader::{finish, DiffMergeReader};
pub use reconcile::Reconciler;
