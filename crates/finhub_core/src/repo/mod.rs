//! Durable medium abstractions and implementations.
//!
//! # Responsibility
//! - Define the string key/value contract the watchlist store writes through.
//! - Isolate SQLite details from store orchestration.
//!
//! # Invariants
//! - A successful `set` is visible to the next `get` on any handle sharing
//!   the same medium (write-through, no write-back lag).
//! - Media report `StorageError` values; callers decide how to soft-fail.

pub mod kv_repo;
