//! Scheduled inbox refresh bound to an explicit lifetime handle.
//!
//! # Responsibility
//! - Refresh an inbox immediately on attach and then on a fixed interval.
//! - Stop deterministically when the owning observer detaches.
//!
//! # Invariants
//! - One poller never overlaps its own refreshes; a tick that comes due
//!   during a slow refresh is delayed, not stacked.
//! - A failed refresh never ends the loop.
//! - Dropping the `PollHandle` cancels the task.

use crate::service::notification_inbox::NotificationInbox;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval between scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Shorter intervals are raised to this value.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns refresh loops for inboxes.
pub struct InboxPoller;

impl InboxPoller {
    /// Starts refreshing `inbox` every `interval` on the current tokio runtime.
    ///
    /// `interval` is clamped to at least `MIN_REFRESH_INTERVAL`.
    ///
    /// # Panics
    /// - Panics when called outside a tokio runtime.
    pub fn attach(inbox: Arc<NotificationInbox>, interval: Duration) -> PollHandle {
        if interval < MIN_REFRESH_INTERVAL {
            warn!(
                "event=inbox_poll_attach module=poller status=clamped requested_ms={} interval_ms={}",
                interval.as_millis(),
                MIN_REFRESH_INTERVAL.as_millis()
            );
        }
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(run_refresh_loop(inbox, interval, cancel_rx));
        info!(
            "event=inbox_poll_attach module=poller status=ok interval_ms={}",
            interval.as_millis()
        );
        PollHandle {
            cancel_tx,
            task: Some(task),
        }
    }
}

/// Lifetime handle of one refresh loop.
#[must_use = "dropping a PollHandle cancels the scheduled refresh"]
pub struct PollHandle {
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Cancels the loop and waits for it to finish its current refresh.
    pub async fn detach(mut self) {
        let _ = self.cancel_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!("event=inbox_poll_detach module=poller status=ok");
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.cancel_tx.send(true);
            task.abort();
            debug!("event=inbox_poll_drop module=poller status=aborted");
        }
    }
}

async fn run_refresh_loop(
    inbox: Arc<NotificationInbox>,
    interval: Duration,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                inbox.refresh().await;
            }
        }
    }
    debug!("event=inbox_poll_loop module=poller status=stopped");
}
