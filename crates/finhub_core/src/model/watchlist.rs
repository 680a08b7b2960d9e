//! Watchlist domain model.
//!
//! # Responsibility
//! - Define the persisted shape of one tracked ticker.
//! - Provide JSON encode/decode for the whole collection.
//!
//! # Invariants
//! - `ticker` is the primary key and is compared case-sensitively.
//! - `added_at` is set once at insertion and never rewritten.
//! - Entries are inserted or removed wholesale, never edited in place.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One tracked ticker in the device-local watchlist.
///
/// Serialized as `{ "ticker", "addedAt", "name"? }`, the layout shared with
/// the web client that first wrote this key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    /// Case-sensitive stock symbol, unique within the collection.
    pub ticker: String,
    /// Insertion time, millisecond precision.
    pub added_at: DateTime<Utc>,
    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WatchlistEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(ticker: impl Into<String>, name: Option<String>) -> Self {
        Self::with_added_at(ticker, name, Utc::now().trunc_subsecs(3))
    }

    /// Creates an entry with a caller-provided insertion time.
    pub fn with_added_at(
        ticker: impl Into<String>,
        name: Option<String>,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            added_at,
            name,
        }
    }
}

/// Decodes a persisted collection.
pub fn decode_entries(raw: &str) -> serde_json::Result<Vec<WatchlistEntry>> {
    serde_json::from_str(raw)
}

/// Encodes a collection for persistence, preserving order.
pub fn encode_entries(entries: &[WatchlistEntry]) -> serde_json::Result<String> {
    serde_json::to_string(entries)
}
