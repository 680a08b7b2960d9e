mod common;

use common::FakeNotificationService;
use finhub_core::{
    InboxPoller, NotificationInbox, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(60);

fn setup(total: usize, unread: usize) -> (Arc<FakeNotificationService>, Arc<NotificationInbox>) {
    let service = Arc::new(FakeNotificationService::seeded(total, unread));
    let inbox = Arc::new(NotificationInbox::new(service.clone()));
    (service, inbox)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[test]
fn default_interval_is_one_minute() {
    assert_eq!(DEFAULT_REFRESH_INTERVAL, INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn refreshes_immediately_then_every_interval() {
    let (_service, inbox) = setup(5, 3);
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);

    settle().await;
    assert_eq!(inbox.status().refresh_attempts, 1);
    assert_eq!(inbox.unread_count(), 3);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(inbox.status().refresh_attempts, 2);

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(inbox.status().refresh_attempts, 4);

    handle.detach().await;
}

#[tokio::test(start_paused = true)]
async fn network_failure_keeps_snapshot_and_schedule_keeps_firing() {
    let (service, inbox) = setup(5, 3);
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);
    settle().await;
    let loaded = inbox.snapshot();
    assert_eq!(loaded.records.len(), 5);

    service.set_offline(true);
    tokio::time::sleep(INTERVAL).await;

    assert_eq!(inbox.snapshot(), loaded);
    let status = inbox.status();
    assert_eq!(status.refresh_attempts, 2);
    assert_eq!(status.refresh_failures, 1);
    assert!(status.last_error.is_some());

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(inbox.status().refresh_attempts, 3);
    assert_eq!(inbox.snapshot(), loaded);

    service.set_offline(false);
    service.remove_directly(5);
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(inbox.status().refresh_attempts, 4);
    assert!(!inbox.is_stale());
    assert_eq!(inbox.snapshot().records.len(), 4);

    handle.detach().await;
}

#[tokio::test(start_paused = true)]
async fn detach_stops_scheduled_refreshes() {
    let (_service, inbox) = setup(3, 1);
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);
    settle().await;

    handle.detach().await;
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(inbox.status().refresh_attempts, 1);
    assert_eq!(Arc::strong_count(&inbox), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_cancels_task() {
    let (_service, inbox) = setup(3, 1);
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);
    settle().await;
    assert!(!handle.is_finished());

    drop(handle);
    tokio::time::sleep(INTERVAL * 3).await;

    assert_eq!(inbox.status().refresh_attempts, 1);
    assert_eq!(Arc::strong_count(&inbox), 1);
}

#[tokio::test(start_paused = true)]
async fn mutation_between_ticks_is_reconciled_before_next_tick() {
    let (service, inbox) = setup(5, 3);
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);
    settle().await;

    inbox.mark_all_as_read().await.unwrap();
    assert_eq!(inbox.unread_count(), 0);
    assert_eq!(inbox.status().refresh_attempts, 2);
    assert_eq!(service.server_unread(), 0);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(inbox.status().refresh_attempts, 3);
    assert_eq!(inbox.unread_count(), 0);

    handle.detach().await;
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_clamped_instead_of_panicking() {
    let (_service, inbox) = setup(3, 1);
    let handle = InboxPoller::attach(Arc::clone(&inbox), Duration::ZERO);
    settle().await;
    assert_eq!(inbox.status().refresh_attempts, 1);

    tokio::time::sleep(MIN_REFRESH_INTERVAL).await;
    assert_eq!(inbox.status().refresh_attempts, 2);

    handle.detach().await;
}

#[tokio::test(start_paused = true)]
async fn tick_due_during_slow_mutation_waits_for_its_reconcile() {
    let (service, inbox) = setup(5, 3);
    let observed = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&observed);
    let watcher = Arc::clone(&inbox);
    let subscription = inbox.changes().subscribe(move || {
        recorder.lock().push(watcher.unread_count());
    });
    let handle = InboxPoller::attach(Arc::clone(&inbox), INTERVAL);
    settle().await;

    service.set_mutation_delay(Duration::from_secs(30));
    tokio::time::sleep(Duration::from_secs(40)).await;
    let mutating = Arc::clone(&inbox);
    let mutation = tokio::spawn(async move { mutating.mark_all_as_read().await });

    // The 60 s tick is due now but the mutation holds the cycle until 70 s.
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(inbox.status().refresh_attempts, 1);
    assert_eq!(service.list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    mutation.await.unwrap().unwrap();
    settle().await;

    assert_eq!(inbox.status().refresh_attempts, 3);
    assert_eq!(*observed.lock(), vec![3, 0, 0]);

    subscription.cancel();
    handle.detach().await;
}
