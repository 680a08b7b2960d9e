//! Watchlist store over the durable medium.
//!
//! # Responsibility
//! - Provide set-like operations on watchlist entries keyed by ticker.
//! - Write the full collection through to the medium on every mutation.
//! - Announce each effective mutation on the store change channel.
//!
//! # Invariants
//! - At most one entry per ticker; insertion order is iteration order.
//! - A broadcast is published only after the durable write returned, so a
//!   subscriber that re-reads observes the new state.
//! - No operation panics or returns an error; medium failures degrade to
//!   empty reads and `false` writes.
//! - Read-modify-write is not atomic across handles sharing a medium; the
//!   later write wins.

use crate::broadcast::{ChangeChannel, WATCHLIST_UPDATED};
use crate::model::watchlist::{decode_entries, encode_entries, WatchlistEntry};
use crate::repo::kv_repo::{KvRepository, StorageError, StorageResult};
use log::{info, warn};
use std::sync::Arc;

/// Storage key shared with the web client.
pub const DEFAULT_WATCHLIST_KEY: &str = "finance-hub-watchlist";

/// Device-local watchlist store.
///
/// Cheap to clone; clones share the medium and the change channel.
#[derive(Clone)]
pub struct WatchlistStore {
    medium: Arc<dyn KvRepository>,
    changes: ChangeChannel,
    key: String,
}

impl WatchlistStore {
    /// Creates a store with its own change channel and the default key.
    pub fn new(medium: Arc<dyn KvRepository>) -> Self {
        Self::with_key(medium, DEFAULT_WATCHLIST_KEY)
    }

    /// Creates a store with its own change channel under a custom key.
    pub fn with_key(medium: Arc<dyn KvRepository>, key: impl Into<String>) -> Self {
        Self::with_channel(medium, ChangeChannel::new(WATCHLIST_UPDATED), key)
    }

    /// Creates a store publishing on a caller-provided channel.
    pub fn with_channel(
        medium: Arc<dyn KvRepository>,
        changes: ChangeChannel,
        key: impl Into<String>,
    ) -> Self {
        Self {
            medium,
            changes,
            key: key.into(),
        }
    }

    /// Channel receiving one signal per effective mutation.
    pub fn changes(&self) -> &ChangeChannel {
        &self.changes
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Returns all entries in insertion order.
    ///
    /// Unavailable or malformed storage yields an empty collection.
    pub fn get_all(&self) -> Vec<WatchlistEntry> {
        match self.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=watchlist_load module=store status=degraded backend={} error={err}",
                    self.medium.backend()
                );
                Vec::new()
            }
        }
    }

    /// Adds `ticker` unless it is blank or already present.
    ///
    /// Returns `true` when the entry was persisted and announced.
    pub fn add(&self, ticker: &str, name: Option<&str>) -> bool {
        if ticker.trim().is_empty() {
            warn!("event=watchlist_add module=store status=rejected reason=empty_ticker");
            return false;
        }

        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(err) => return self.write_failed("watchlist_add", ticker, &err),
        };
        if entries.iter().any(|entry| entry.ticker == ticker) {
            return false;
        }

        entries.push(WatchlistEntry::new(ticker, name.map(str::to_string)));
        if let Err(err) = self.persist(&entries) {
            return self.write_failed("watchlist_add", ticker, &err);
        }

        info!(
            "event=watchlist_add module=store status=ok ticker={ticker} count={}",
            entries.len()
        );
        self.changes.publish();
        true
    }

    /// Removes `ticker`. Returns `false` when it was not present.
    pub fn remove(&self, ticker: &str) -> bool {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(err) => return self.write_failed("watchlist_remove", ticker, &err),
        };
        let before = entries.len();
        let remaining: Vec<WatchlistEntry> = entries
            .into_iter()
            .filter(|entry| entry.ticker != ticker)
            .collect();
        if remaining.len() == before {
            return false;
        }

        if let Err(err) = self.persist(&remaining) {
            return self.write_failed("watchlist_remove", ticker, &err);
        }

        info!(
            "event=watchlist_remove module=store status=ok ticker={ticker} count={}",
            remaining.len()
        );
        self.changes.publish();
        true
    }

    pub fn has(&self, ticker: &str) -> bool {
        self.get_all().iter().any(|entry| entry.ticker == ticker)
    }

    /// Returns the entry for `ticker`, if tracked.
    pub fn get(&self, ticker: &str) -> Option<WatchlistEntry> {
        self.get_all()
            .into_iter()
            .find(|entry| entry.ticker == ticker)
    }

    /// Returns tracked tickers in insertion order.
    pub fn tickers(&self) -> Vec<String> {
        self.get_all()
            .into_iter()
            .map(|entry| entry.ticker)
            .collect()
    }

    /// Empties the collection and announces it, even when already empty.
    pub fn clear(&self) {
        match self.persist(&[]) {
            Ok(()) => {
                info!("event=watchlist_clear module=store status=ok");
                self.changes.publish();
            }
            Err(err) => {
                warn!(
                    "event=watchlist_clear module=store status=error backend={} error={err}",
                    self.medium.backend()
                );
            }
        }
    }

    pub fn count(&self) -> usize {
        self.get_all().len()
    }

    fn load(&self) -> StorageResult<Vec<WatchlistEntry>> {
        match self.medium.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(raw) => {
                decode_entries(&raw).map_err(|err| StorageError::Corrupt(err.to_string()))
            }
        }
    }

    fn persist(&self, entries: &[WatchlistEntry]) -> StorageResult<()> {
        let encoded =
            encode_entries(entries).map_err(|err| StorageError::Corrupt(err.to_string()))?;
        self.medium.set(&self.key, &encoded)
    }

    fn write_failed(&self, event: &str, ticker: &str, err: &StorageError) -> bool {
        warn!(
            "event={event} module=store status=error backend={} ticker={ticker} error={err}",
            self.medium.backend()
        );
        false
    }
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistStore")
            .field("backend", &self.medium.backend())
            .field("key", &self.key)
            .finish()
    }
}
