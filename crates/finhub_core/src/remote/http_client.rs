//! HTTP implementation of the notification service contract.

use super::{NotificationQuery, NotificationSource, RemoteError, RemoteResult};
use crate::model::notification::{NotificationId, NotificationRecord};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

const NOTIFICATIONS_PATH: &str = "api/v1/notifications";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    unread_count: u32,
}

/// `reqwest` client for the dashboard notification endpoints.
#[derive(Debug, Clone)]
pub struct HttpNotificationClient {
    client: Client,
    base_url: Url,
    user_id: Option<i64>,
}

impl HttpNotificationClient {
    /// Creates a client rooted at `base_url` (for example `http://localhost:8001`).
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| RemoteError::Unavailable(format!("invalid base url `{base_url}`: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            user_id: None,
        })
    }

    /// Scopes unread counting and mark-all to one user.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, suffix: &str) -> RemoteResult<Url> {
        let path = if suffix.is_empty() {
            NOTIFICATIONS_PATH.to_string()
        } else {
            format!("{NOTIFICATIONS_PATH}/{suffix}")
        };
        self.base_url
            .join(&path)
            .map_err(|err| RemoteError::Unavailable(format!("invalid endpoint `{path}`: {err}")))
    }

    fn with_user_param(&self, mut url: Url) -> Url {
        if let Some(user_id) = self.user_id {
            url.query_pairs_mut()
                .append_pair("user_id", &user_id.to_string());
        }
        url
    }

    /// Builds the list URL for `query`.
    pub fn list_url(&self, query: &NotificationQuery) -> RemoteResult<Url> {
        let mut url = self.endpoint("")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &query.limit.to_string());
            if query.offset > 0 {
                pairs.append_pair("offset", &query.offset.to_string());
            }
            if let Some(is_read) = query.is_read {
                pairs.append_pair("is_read", if is_read { "true" } else { "false" });
            }
            if let Some(kind) = query.kind {
                pairs.append_pair("type", kind.as_str());
            }
            if let Some(user_id) = query.user_id.or(self.user_id) {
                pairs.append_pair("user_id", &user_id.to_string());
            }
        }
        Ok(url)
    }
}

/// Maps non-success responses; 404 becomes `NotFound` for id-addressed calls.
async fn check_status(response: Response, id: Option<NotificationId>) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(RemoteError::NotFound(id));
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl NotificationSource for HttpNotificationClient {
    async fn list(&self, query: &NotificationQuery) -> RemoteResult<Vec<NotificationRecord>> {
        let url = self.list_url(query)?;
        debug!("event=remote_list module=remote status=start url={url}");
        let response = check_status(self.client.get(url).send().await?, None).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    async fn unread_count(&self) -> RemoteResult<u32> {
        let url = self.with_user_param(self.endpoint("unread-count")?);
        let response = check_status(self.client.get(url).send().await?, None).await?;
        let body = response.text().await?;
        let parsed: UnreadCountResponse =
            serde_json::from_str(&body).map_err(|err| RemoteError::Decode(err.to_string()))?;
        Ok(parsed.unread_count)
    }

    async fn mark_read(&self, id: NotificationId) -> RemoteResult<()> {
        let url = self.endpoint(&format!("{id}/read"))?;
        check_status(self.client.patch(url).send().await?, Some(id)).await?;
        Ok(())
    }

    async fn mark_all_read(&self) -> RemoteResult<()> {
        let url = self.with_user_param(self.endpoint("mark-all-read")?);
        check_status(self.client.patch(url).send().await?, None).await?;
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> RemoteResult<()> {
        let url = self.endpoint(&id.to_string())?;
        check_status(self.client.delete(url).send().await?, Some(id)).await?;
        Ok(())
    }
}
