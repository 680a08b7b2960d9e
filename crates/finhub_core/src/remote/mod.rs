//! Remote notification service contract.
//!
//! # Responsibility
//! - Define the calls the inbox makes against the notification service.
//! - Define list filters and the remote failure taxonomy.
//!
//! # Invariants
//! - `list` returns records most-recent-first.
//! - `mark_read` is idempotent on the service side.

use crate::model::notification::{NotificationId, NotificationKind, NotificationRecord};
use async_trait::async_trait;
use thiserror::Error;

mod http_client;

pub use http_client::HttpNotificationClient;

/// Page size used when a caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page the service accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure taxonomy for remote notification calls.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Id-addressed call against a record the service no longer has.
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error("notification service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid notification service payload: {0}")]
    Decode(String),
    #[error("notification service unavailable: {0}")]
    Unavailable(String),
}

/// Filters for the notification list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    pub limit: u32,
    pub offset: u32,
    pub is_read: Option<bool>,
    pub kind: Option<NotificationKind>,
    /// Restricts to one user plus system-wide records.
    pub user_id: Option<i64>,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self::page(DEFAULT_PAGE_SIZE)
    }
}

impl NotificationQuery {
    /// First page of `limit` records, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page(limit: u32) -> Self {
        Self {
            limit: normalize_page_size(Some(limit)),
            offset: 0,
            is_read: None,
            kind: None,
            user_id: None,
        }
    }
}

/// Clamps a requested page size into the range the service accepts.
pub fn normalize_page_size(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Remote notification service consumed by `NotificationInbox`.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn list(&self, query: &NotificationQuery) -> RemoteResult<Vec<NotificationRecord>>;
    async fn unread_count(&self) -> RemoteResult<u32>;
    async fn mark_read(&self, id: NotificationId) -> RemoteResult<()>;
    async fn mark_all_read(&self) -> RemoteResult<()>;
    async fn delete(&self, id: NotificationId) -> RemoteResult<()>;
}
