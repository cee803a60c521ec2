//! Transaction isolation for strata feature sources
//!
//! This crate implements write isolation with:
//! - [`Diff`]: mutex-guarded overlay of staged adds, modifications, removals
//! - [`DiffState`]: binds a Diff to one (store, transaction) pair and owns
//!   the commit/rollback protocol
//! - [`Transaction`]: session handle; [`Transaction::AUTO_COMMIT`] bypasses
//!   isolation entirely

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod state;
pub mod transaction;

pub use diff::{Applied, Diff, DiffEntries, DiffView, Modification, ModifiedEntry};
pub use state::{DiffState, TransactionState};
pub use transaction::{Transaction, TransactionStatus};
