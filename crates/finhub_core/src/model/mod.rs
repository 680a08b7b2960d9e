//! Domain model for the local state layer.
//!
//! # Responsibility
//! - Define the watchlist entry persisted on the device.
//! - Define the notification record and inbox snapshot mirrored from the
//!   remote notification service.
//!
//! # Invariants
//! - A watchlist entry is identified by its case-sensitive ticker.
//! - Notification records are created by the remote service only.

pub mod notification;
pub mod watchlist;
