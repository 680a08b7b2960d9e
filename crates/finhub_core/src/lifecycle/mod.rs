//! Observer lifecycle primitives.
//!
//! # Responsibility
//! - Defer durable reads until an observer is activated.
//! - Tie store subscriptions to observer lifetimes.

pub mod mount_guard;
pub mod watchlist_observer;
