//! # Storage Module
//!
//! Record storage backed by the redb embedded database.
//!
//! Uses redb for:
//! - ACID transactions (a failed import leaves its table untouched)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

mod redb_store;

pub use redb_store::{RecordSource, Snapshot, Store, StoreTxn};
