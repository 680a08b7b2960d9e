//! Notification domain model mirrored from the remote service.
//!
//! # Responsibility
//! - Define the notification record and its severity/kind classifications.
//! - Define the inbox snapshot committed by one reload.
//!
//! # Invariants
//! - Records move `unread -> read` only; never back.
//! - `InboxSnapshot::unread_count` comes from the same reload as `records`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned notification identifier.
pub type NotificationId = i64;

/// Presentation priority of a notification. Does not affect lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Origin category assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PriceAlert,
    PredictionUpdate,
    RebalanceNeeded,
    News,
    PortfolioGoal,
    /// Any category this client does not know yet.
    #[serde(other)]
    Other,
}

impl NotificationKind {
    /// Wire name used by the service query string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PriceAlert => "price_alert",
            Self::PredictionUpdate => "prediction_update",
            Self::RebalanceNeeded => "rebalance_needed",
            Self::News => "news",
            Self::PortfolioGoal => "portfolio_goal",
            Self::Other => "other",
        }
    }
}

/// One notification as returned by the service list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    /// `None` for system-wide notifications.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Free reference to a stock symbol; not validated locally.
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub is_read: bool,
    /// Opaque JSON payload attached by the producer.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Records and unread counter captured by one reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxSnapshot {
    /// Most-recent-first page of records.
    pub records: Vec<NotificationRecord>,
    /// Server-side unread total, which may exceed the unread records in the page.
    pub unread_count: u32,
}

impl InboxSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns unread records from the current page.
    pub fn unread_records(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter().filter(|record| !record.is_read)
    }

    /// Returns one record by id.
    pub fn get(&self, id: NotificationId) -> Option<&NotificationRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Short unread badge text: `None` at zero, `"9+"` above nine.
    pub fn badge_label(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            count @ 1..=9 => Some(count.to_string()),
            _ => Some("9+".to_string()),
        }
    }
}

/// Parses service timestamps.
///
/// Accepts RFC 3339 and naive ISO-8601 (the service emits naive values);
/// naive values are interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`")))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp `{raw}`"))),
    }
}
