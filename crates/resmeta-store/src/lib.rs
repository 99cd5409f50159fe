//! Resmeta Store - Persistent metadata database
//!
//! This crate provides the warm-start cache of the metadata pipeline: a
//! key/value database of JSON documents keyed by concrete address, with a
//! redb-backed and an in-memory implementation, plus the background worker
//! that mirrors freshly fetched metadata into it.

pub mod database;
pub mod error;
pub mod memory;
pub mod store;
pub mod tables;
pub mod worker;

// Re-exports
pub use database::{Documents, MetaDatabase};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryDatabase;
pub use store::RedbDatabase;
pub use tables::MetaTable;
pub use worker::WorkerChannel;
