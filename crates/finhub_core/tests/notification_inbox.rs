mod common;

use common::FakeNotificationService;
use finhub_core::{NotificationInbox, NotificationQuery, RemoteError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn inbox_over(service: &Arc<FakeNotificationService>) -> NotificationInbox {
    NotificationInbox::new(service.clone())
}

#[tokio::test]
async fn inbox_starts_loading_with_empty_snapshot() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);

    let status = inbox.status();
    assert!(status.loading);
    assert!(status.snapshot.is_empty());
    assert_eq!(status.refresh_attempts, 0);
}

#[tokio::test]
async fn refresh_loads_records_and_counter_together() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);

    let snapshot = inbox.refresh().await;

    assert_eq!(snapshot.records.len(), 5);
    assert_eq!(snapshot.unread_count, 3);
    assert_eq!(inbox.unread_count(), 3);
    assert_eq!(snapshot.records[0].id, 5, "most recent first");
    assert_eq!(service.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.count_calls.load(Ordering::SeqCst), 1);
    assert!(!inbox.status().loading);
}

#[tokio::test]
async fn mark_as_read_reconciles_unread_count() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    inbox.refresh().await;
    let unread_id = inbox.snapshot().unread_records().next().unwrap().id;

    inbox.mark_as_read(unread_id).await.unwrap();

    assert_eq!(inbox.unread_count(), 2);
    assert!(inbox.snapshot().get(unread_id).unwrap().is_read);
    assert_eq!(service.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mark_as_read_is_idempotent() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    inbox.refresh().await;
    let read_id = inbox
        .snapshot()
        .records
        .iter()
        .find(|record| record.is_read)
        .unwrap()
        .id;

    inbox.mark_as_read(read_id).await.unwrap();
    assert_eq!(inbox.unread_count(), 3);
}

#[tokio::test]
async fn mark_all_as_read_leaves_nothing_unread() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    inbox.refresh().await;

    inbox.mark_all_as_read().await.unwrap();
    let snapshot = inbox.refresh().await;

    assert_eq!(snapshot.unread_count, 0);
    assert!(snapshot.records.iter().all(|record| record.is_read));
    assert_eq!(snapshot.badge_label(), None);
}

#[tokio::test]
async fn delete_removes_record_after_reload() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    inbox.refresh().await;

    inbox.delete(2).await.unwrap();

    let snapshot = inbox.snapshot();
    assert_eq!(snapshot.records.len(), 4);
    assert!(snapshot.get(2).is_none());
    assert_eq!(snapshot.unread_count, 2);
}

#[tokio::test]
async fn mutation_on_vanished_record_reports_error_and_still_reconciles() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    inbox.refresh().await;
    service.remove_directly(1);

    let err = inbox.delete(1).await.unwrap_err();

    assert!(matches!(err, RemoteError::NotFound(1)));
    assert!(inbox.snapshot().get(1).is_none());
    assert_eq!(inbox.unread_count(), service.server_unread());
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_snapshot() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    let good = inbox.refresh().await;

    service.set_offline(true);
    let after_failure = inbox.refresh().await;

    assert_eq!(after_failure, good);
    assert!(inbox.is_stale());
    let status = inbox.status();
    assert_eq!(status.refresh_failures, 1);
    assert!(status.last_error.unwrap().contains("connection refused"));

    service.set_offline(false);
    inbox.refresh().await;
    assert!(!inbox.is_stale());
}

#[tokio::test]
async fn counter_failure_discards_fresh_record_list() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    let good = inbox.refresh().await;

    service.remove_directly(5);
    service.set_count_failing(true);
    let after_failure = inbox.refresh().await;

    assert_eq!(after_failure, good);
    assert_eq!(inbox.snapshot().records.len(), 5);
    assert_eq!(inbox.unread_count(), 3);
    assert!(inbox.is_stale());
    assert!(inbox.last_error().unwrap().contains("unread-count unavailable"));
    assert_eq!(inbox.status().refresh_failures, 1);

    service.set_count_failing(false);
    let recovered = inbox.refresh().await;
    assert_eq!(recovered.records.len(), 4);
    assert_eq!(recovered.unread_count, 3);
    assert!(!inbox.is_stale());
}

#[tokio::test]
async fn list_failure_discards_fresh_counter() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    let good = inbox.refresh().await;

    service.remove_directly(1);
    assert_eq!(service.server_unread(), 2);
    service.set_list_failing(true);
    let after_failure = inbox.refresh().await;

    assert_eq!(after_failure, good);
    assert_eq!(inbox.unread_count(), 3);
    assert!(inbox.snapshot().get(1).is_some());
    assert!(inbox.is_stale());
    assert!(inbox.last_error().unwrap().contains("list unavailable"));

    service.set_list_failing(false);
    let recovered = inbox.refresh().await;
    assert_eq!(recovered.unread_count, 2);
    assert!(recovered.get(1).is_none());
    assert!(!inbox.is_stale());
}

#[tokio::test]
async fn failed_mutation_while_offline_keeps_snapshot() {
    let service = Arc::new(FakeNotificationService::seeded(5, 3));
    let inbox = inbox_over(&service);
    let good = inbox.refresh().await;
    service.set_offline(true);

    assert!(matches!(
        inbox.mark_all_as_read().await,
        Err(RemoteError::Unavailable(_))
    ));
    assert_eq!(inbox.snapshot(), good);
    assert!(inbox.is_stale());
}

#[tokio::test]
async fn every_refresh_attempt_is_broadcast() {
    let service = Arc::new(FakeNotificationService::seeded(2, 1));
    let inbox = inbox_over(&service);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let _subscription = inbox.changes().subscribe(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    inbox.refresh().await;
    service.set_offline(true);
    inbox.refresh().await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn page_size_bounds_the_record_list_but_not_the_counter() {
    let service = Arc::new(FakeNotificationService::seeded(30, 25));
    let inbox = NotificationInbox::with_query(service.clone(), NotificationQuery::page(20));

    let snapshot = inbox.refresh().await;

    assert_eq!(snapshot.records.len(), 20);
    assert_eq!(snapshot.unread_count, 25);
    assert_eq!(snapshot.badge_label().as_deref(), Some("9+"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_mutations_do_not_interleave_refreshes() {
    let service = Arc::new(FakeNotificationService::seeded(10, 10));
    let inbox = Arc::new(inbox_over(&service));
    inbox.refresh().await;

    let tasks: Vec<_> = (1..=5)
        .map(|id| {
            let inbox = Arc::clone(&inbox);
            tokio::spawn(async move { inbox.mark_as_read(id).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(inbox.unread_count(), 5);
    assert_eq!(inbox.status().refresh_attempts, 6);
    assert_eq!(
        inbox.snapshot().unread_records().count() as u32,
        inbox.unread_count()
    );
}
