//! Isolation Integration Tests
//!
//! End-to-end tests for feature sources over `MemoryStore`: count
//! reconciliation, merged reads, commit/rollback and cross-transaction
//! isolation.

#[path = "../common/mod.rs"]
mod common;

mod commit;
mod concurrent;
mod config;
mod counting;
mod info;
mod reads;
mod scenarios;
