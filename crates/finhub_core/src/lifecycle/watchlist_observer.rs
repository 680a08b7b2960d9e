//! Watchlist observers built on `MountGuard`.
//!
//! # Responsibility
//! - `TickerToggle`: watched flag for one ticker, with add/remove toggle.
//! - `WatchlistView`: full entry list, with remove and clear.
//!
//! # Invariants
//! - Observers hold no watchlist state of their own beyond what the last
//!   store read returned.
//! - Mutations go through `WatchlistStore`; the store broadcast refreshes
//!   every mounted observer, including the caller.

use crate::lifecycle::mount_guard::MountGuard;
use crate::model::watchlist::WatchlistEntry;
use crate::service::watchlist_store::WatchlistStore;

/// Watched flag for a single ticker.
#[derive(Debug)]
pub struct TickerToggle {
    store: WatchlistStore,
    ticker: String,
    name: Option<String>,
    guard: MountGuard<bool>,
}

impl TickerToggle {
    pub fn new(store: &WatchlistStore, ticker: impl Into<String>, name: Option<String>) -> Self {
        let ticker = ticker.into();
        let reader_store = store.clone();
        let reader_ticker = ticker.clone();
        let guard = MountGuard::new(store.changes(), false, move || {
            reader_store.has(&reader_ticker)
        });
        Self {
            store: store.clone(),
            ticker,
            name,
            guard,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn activate(&mut self) -> bool {
        self.guard.activate()
    }

    /// `None` until activated.
    pub fn is_watched(&self) -> Option<bool> {
        self.guard.current()
    }

    /// Removes the ticker when watched, adds it otherwise.
    ///
    /// Returns the re-derived watched flag, or `None` while inert.
    pub fn toggle(&mut self) -> Option<bool> {
        let watched = self.guard.current()?;
        if watched {
            self.store.remove(&self.ticker);
        } else {
            self.store.add(&self.ticker, self.name.as_deref());
        }
        self.guard.current()
    }

    pub fn detach(&mut self) {
        self.guard.detach();
    }
}

/// Full watchlist listing.
#[derive(Debug)]
pub struct WatchlistView {
    store: WatchlistStore,
    guard: MountGuard<Vec<WatchlistEntry>>,
}

impl WatchlistView {
    pub fn new(store: &WatchlistStore) -> Self {
        let reader_store = store.clone();
        let guard = MountGuard::new(store.changes(), Vec::new(), move || reader_store.get_all());
        Self {
            store: store.clone(),
            guard,
        }
    }

    pub fn activate(&mut self) -> bool {
        self.guard.activate()
    }

    /// `None` until activated.
    pub fn entries(&self) -> Option<Vec<WatchlistEntry>> {
        self.guard.current()
    }

    pub fn len(&self) -> usize {
        self.guard.current().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remove(&self, ticker: &str) -> bool {
        self.store.remove(ticker)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn detach(&mut self) {
        self.guard.detach();
    }
}
