//! Notification inbox cache over the remote notification service.
//!
//! # Responsibility
//! - Pull one bounded page of records plus the unread counter per refresh.
//! - Forward read/delete mutations to the service and reconcile by reload.
//! - Announce every refresh attempt on the inbox change channel.
//!
//! # Invariants
//! - Records and unread counter are committed together, from one reload.
//! - A failed refresh keeps the last good snapshot and records the error.
//! - No local optimistic mutation; mutations always end with a refresh.
//! - Refreshes are serialized per inbox, and a mutation holds the cycle lock
//!   across its remote call and its refresh.

use crate::broadcast::{ChangeChannel, INBOX_UPDATED};
use crate::model::notification::{InboxSnapshot, NotificationId};
use crate::remote::{NotificationQuery, NotificationSource, RemoteError, RemoteResult};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Snapshot plus refresh bookkeeping exposed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxStatus {
    pub snapshot: InboxSnapshot,
    /// `true` until the first refresh attempt finished.
    pub loading: bool,
    /// Message of the latest failed refresh; cleared by a successful one.
    pub last_error: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub refresh_attempts: u64,
    pub refresh_failures: u64,
}

impl Default for InboxStatus {
    fn default() -> Self {
        Self {
            snapshot: InboxSnapshot::empty(),
            loading: true,
            last_error: None,
            last_refreshed_at: None,
            refresh_attempts: 0,
            refresh_failures: 0,
        }
    }
}

/// Periodically refreshed cache of the remote notification inbox.
pub struct NotificationInbox {
    source: Arc<dyn NotificationSource>,
    query: NotificationQuery,
    status: RwLock<InboxStatus>,
    cycle: Mutex<()>,
    changes: ChangeChannel,
}

impl NotificationInbox {
    /// Creates an inbox listing the first page with the default page size.
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self::with_query(source, NotificationQuery::default())
    }

    pub fn with_query(source: Arc<dyn NotificationSource>, query: NotificationQuery) -> Self {
        Self {
            source,
            query,
            status: RwLock::new(InboxStatus::default()),
            cycle: Mutex::new(()),
            changes: ChangeChannel::new(INBOX_UPDATED),
        }
    }

    pub fn query(&self) -> &NotificationQuery {
        &self.query
    }

    /// Channel signalled after every refresh attempt.
    pub fn changes(&self) -> &ChangeChannel {
        &self.changes
    }

    pub fn snapshot(&self) -> InboxSnapshot {
        self.status.read().snapshot.clone()
    }

    pub fn unread_count(&self) -> u32 {
        self.status.read().snapshot.unread_count
    }

    pub fn status(&self) -> InboxStatus {
        self.status.read().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.status.read().last_error.clone()
    }

    /// `true` when the held snapshot survived a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.status.read().last_error.is_some()
    }

    /// Reloads records and unread counter together.
    ///
    /// Never fails: on error the previous snapshot is returned unchanged.
    pub async fn refresh(&self) -> InboxSnapshot {
        let _cycle = self.cycle.lock().await;
        self.refresh_locked().await
    }

    /// Marks one record read on the service, then reloads.
    pub async fn mark_as_read(&self, id: NotificationId) -> RemoteResult<()> {
        let _cycle = self.cycle.lock().await;
        let outcome = self.source.mark_read(id).await;
        self.reconcile("mark_as_read", Some(id), outcome).await
    }

    /// Marks every record read on the service, then reloads.
    pub async fn mark_all_as_read(&self) -> RemoteResult<()> {
        let _cycle = self.cycle.lock().await;
        let outcome = self.source.mark_all_read().await;
        self.reconcile("mark_all_as_read", None, outcome).await
    }

    /// Deletes one record on the service, then reloads.
    pub async fn delete(&self, id: NotificationId) -> RemoteResult<()> {
        let _cycle = self.cycle.lock().await;
        let outcome = self.source.delete(id).await;
        self.reconcile("delete", Some(id), outcome).await
    }

    async fn reconcile(
        &self,
        operation: &'static str,
        id: Option<NotificationId>,
        outcome: RemoteResult<()>,
    ) -> RemoteResult<()> {
        let id_label = id.map_or_else(|| "all".to_string(), |id| id.to_string());
        match &outcome {
            Ok(()) => info!(
                "event=inbox_mutation module=inbox status=ok operation={operation} id={id_label}"
            ),
            Err(RemoteError::NotFound(_)) => warn!(
                "event=inbox_mutation module=inbox status=not_found operation={operation} id={id_label}"
            ),
            Err(err) => error!(
                "event=inbox_mutation module=inbox status=error operation={operation} id={id_label} error={err}"
            ),
        }
        self.refresh_locked().await;
        outcome
    }

    async fn refresh_locked(&self) -> InboxSnapshot {
        let started_at = Instant::now();
        let (records, unread) =
            tokio::join!(self.source.list(&self.query), self.source.unread_count());

        let snapshot = {
            let mut status = self.status.write();
            status.loading = false;
            status.refresh_attempts += 1;
            match (records, unread) {
                (Ok(records), Ok(unread_count)) => {
                    status.snapshot = InboxSnapshot {
                        records,
                        unread_count,
                    };
                    status.last_error = None;
                    status.last_refreshed_at = Some(Utc::now());
                    info!(
                        "event=inbox_refresh module=inbox status=ok records={} unread={} duration_ms={}",
                        status.snapshot.records.len(),
                        unread_count,
                        started_at.elapsed().as_millis()
                    );
                }
                (Err(err), _) | (_, Err(err)) => {
                    status.refresh_failures += 1;
                    error!(
                        "event=inbox_refresh module=inbox status=error retained_records={} duration_ms={} error={err}",
                        status.snapshot.records.len(),
                        started_at.elapsed().as_millis()
                    );
                    status.last_error = Some(err.to_string());
                }
            }
            status.snapshot.clone()
        };

        self.changes.publish();
        snapshot
    }
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox")
            .field("query", &self.query)
            .field("status", &*self.status.read())
            .finish()
    }
}
