#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use finhub_core::{
    NotificationId, NotificationKind, NotificationQuery, NotificationRecord, NotificationSource,
    RemoteError, RemoteResult, Severity,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

/// In-memory notification service with failure injection.
#[derive(Default)]
pub struct FakeNotificationService {
    records: Mutex<Vec<NotificationRecord>>,
    offline: AtomicBool,
    list_failing: AtomicBool,
    count_failing: AtomicBool,
    mutation_delay: Mutex<StdDuration>,
    pub list_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
}

impl FakeNotificationService {
    /// Seeds `total` records, the first `unread` of them unread.
    pub fn seeded(total: usize, unread: usize) -> Self {
        let service = Self::default();
        {
            let mut records = service.records.lock();
            for index in 0..total {
                records.push(record(index as NotificationId + 1, index >= unread));
            }
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        service
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fails only the record list endpoint.
    pub fn set_list_failing(&self, failing: bool) {
        self.list_failing.store(failing, Ordering::SeqCst);
    }

    /// Fails only the unread counter endpoint.
    pub fn set_count_failing(&self, failing: bool) {
        self.count_failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every mutation wait `delay` before touching server state.
    pub fn set_mutation_delay(&self, delay: StdDuration) {
        *self.mutation_delay.lock() = delay;
    }

    /// Mutates server state behind the inbox's back.
    pub fn remove_directly(&self, id: NotificationId) {
        self.records.lock().retain(|record| record.id != id);
    }

    pub fn server_unread(&self) -> u32 {
        self.records.lock().iter().filter(|r| !r.is_read).count() as u32
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_switch(&self, switch: &AtomicBool, endpoint: &str) -> RemoteResult<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                body: format!("{endpoint} unavailable"),
            });
        }
        Ok(())
    }

    async fn mutation_latency(&self) {
        let delay = *self.mutation_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl NotificationSource for FakeNotificationService {
    async fn list(&self, query: &NotificationQuery) -> RemoteResult<Vec<NotificationRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.check_switch(&self.list_failing, "list")?;
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| query.is_read.map_or(true, |flag| record.is_read == flag))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn unread_count(&self) -> RemoteResult<u32> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.check_switch(&self.count_failing, "unread-count")?;
        Ok(self.server_unread())
    }

    async fn mark_read(&self, id: NotificationId) -> RemoteResult<()> {
        self.mutation_latency().await;
        self.check_online()?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(RemoteError::NotFound(id))?;
        if !record.is_read {
            record.is_read = true;
            record.read_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_all_read(&self) -> RemoteResult<()> {
        self.mutation_latency().await;
        self.check_online()?;
        for record in self.records.lock().iter_mut().filter(|r| !r.is_read) {
            record.is_read = true;
            record.read_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> RemoteResult<()> {
        self.mutation_latency().await;
        self.check_online()?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(RemoteError::NotFound(id));
        }
        Ok(())
    }
}

pub fn record(id: NotificationId, is_read: bool) -> NotificationRecord {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    NotificationRecord {
        id,
        user_id: None,
        ticker: Some("AAPL".to_string()),
        kind: NotificationKind::PriceAlert,
        title: format!("alert {id}"),
        message: format!("message {id}"),
        severity: Severity::Info,
        is_read,
        data: None,
        created_at: base + Duration::minutes(id),
        read_at: None,
    }
}
