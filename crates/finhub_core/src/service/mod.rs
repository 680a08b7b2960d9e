//! Core use-case services.
//!
//! # Responsibility
//! - Own the watchlist store and notification inbox state machines.
//! - Keep observers decoupled from medium and transport details.

pub mod inbox_poller;
pub mod notification_inbox;
pub mod watchlist_store;
