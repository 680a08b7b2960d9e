//! Client-side local state layer for the finhub dashboard.
//!
//! Holds the device-local watchlist store with its change broadcast, the
//! two-phase observer lifecycle, and the polling notification inbox cache.

pub mod broadcast;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod service;

pub use broadcast::{ChangeChannel, Subscription};
pub use config::{ConfigError, CoreConfig, DEFAULT_DB_FILE_NAME, IN_MEMORY_DB_PATH};
pub use lifecycle::mount_guard::{MountGuard, MountPhase};
pub use lifecycle::watchlist_observer::{TickerToggle, WatchlistView};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::notification::{
    InboxSnapshot, NotificationId, NotificationKind, NotificationRecord, Severity,
};
pub use model::watchlist::WatchlistEntry;
pub use remote::{
    HttpNotificationClient, NotificationQuery, NotificationSource, RemoteError, RemoteResult,
};
pub use repo::kv_repo::{
    KvRepository, MemoryKvRepository, SqliteKvRepository, StorageError, StorageResult,
    UnavailableKvRepository,
};
pub use service::inbox_poller::{
    InboxPoller, PollHandle, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL,
};
pub use service::notification_inbox::{InboxStatus, NotificationInbox};
pub use service::watchlist_store::{WatchlistStore, DEFAULT_WATCHLIST_KEY};

use std::path::Path;
use std::sync::Arc;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the SQLite medium at `path`, or an in-memory one for `None`.
///
/// Falls back to `UnavailableKvRepository` when the database cannot be
/// opened, so store operations degrade instead of failing.
pub fn open_medium(path: Option<&Path>) -> Arc<dyn KvRepository> {
    let opened = match path {
        Some(path) => db::open_db(path),
        None => db::open_db_in_memory(),
    };
    match opened
        .map_err(StorageError::from)
        .and_then(SqliteKvRepository::try_new)
    {
        Ok(repo) => Arc::new(repo),
        Err(err) => {
            log::warn!("event=medium_open module=core status=degraded error={err}");
            Arc::new(UnavailableKvRepository::new(err.to_string()))
        }
    }
}
