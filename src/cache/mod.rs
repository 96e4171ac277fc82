//! Remote snapshot cache bridge. The cache is an external key-value
//! snapshot store (a Convex deployment); every operation here is
//! best-effort and callers must function with the cache absent or
//! unreachable.

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::inbox::{AccountSummary, InboxMessage, MergedMessage};

/// One cached aggregation pass: the merged listing plus per-account
/// totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxSnapshot {
    pub messages: Vec<InboxMessage>,
    pub accounts: Vec<AccountSummary>,
}

/// A cached message record. Body fields are only present once a detail
/// fetch has supplemented the listing row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedMessageDetail {
    pub id: String,
    pub message_id: String,
    pub account_email: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub preview: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub body: Option<String>,
}

impl CachedMessageDetail {
    /// Whether any body field has been populated, i.e. a detail fetch
    /// already happened for this record.
    pub fn has_body(&self) -> bool {
        [&self.body_text, &self.body_html, &self.body]
            .iter()
            .any(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }
}

#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn get_inbox_snapshot(&self, max_results: usize) -> Result<InboxSnapshot>;
    async fn upsert_inbox_snapshot(
        &self,
        messages: &[MergedMessage],
        accounts: &[AccountSummary],
    ) -> Result<()>;
    async fn get_message_detail(
        &self,
        account_email: &str,
        message_id: &str,
    ) -> Result<Option<CachedMessageDetail>>;
    #[allow(clippy::too_many_arguments)]
    async fn upsert_message_detail(
        &self,
        account_email: &str,
        message_id: &str,
        from: &str,
        subject: &str,
        date: &str,
        preview: &str,
        body_text: &str,
        body_html: &str,
        body: &str,
        sort_time: i64,
    ) -> Result<()>;
}

/// Snapshot cache backed by a Convex deployment's HTTP API
/// (`POST /api/query`, `POST /api/mutation`).
#[derive(Clone)]
pub struct ConvexCache {
    http: Client,
    base_url: String,
}

impl ConvexCache {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn call(&self, endpoint: &str, path: &str, args: Value) -> Result<Value> {
        let url = format!("{}/api/{}", self.base_url.trim_end_matches('/'), endpoint);
        let body = json!({
            "path": path,
            "args": args,
            "format": "json",
        });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("Cache request failed with status {}", status);
        }

        let data: Value = response.json().await?;
        match data.get("status").and_then(Value::as_str) {
            Some("success") => Ok(data.get("value").cloned().unwrap_or(Value::Null)),
            _ => {
                let message = data
                    .get("errorMessage")
                    .and_then(Value::as_str)
                    .unwrap_or("Cache call failed");
                Err(anyhow!(message.to_string()))
            }
        }
    }
}

#[async_trait]
impl SnapshotCache for ConvexCache {
    async fn get_inbox_snapshot(&self, max_results: usize) -> Result<InboxSnapshot> {
        let value = self
            .call(
                "query",
                "emailCache:getInboxSnapshot",
                json!({ "maxResults": max_results }),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn upsert_inbox_snapshot(
        &self,
        messages: &[MergedMessage],
        accounts: &[AccountSummary],
    ) -> Result<()> {
        let messages: Vec<Value> = messages
            .iter()
            .map(|message| {
                json!({
                    "accountEmail": message.account_email,
                    "messageId": message.message_id,
                    "from": message.from,
                    "subject": message.subject,
                    "date": message.date,
                    "preview": message.preview,
                    "sortTime": message.sort_time,
                })
            })
            .collect();
        let accounts: Vec<Value> = accounts
            .iter()
            .map(|account| {
                json!({
                    "id": account.id,
                    "email": account.email,
                    "messagesTotal": account.messages_total,
                    "threadsTotal": account.threads_total,
                })
            })
            .collect();

        self.call(
            "mutation",
            "emailCache:upsertInboxSnapshot",
            json!({ "messages": messages, "accounts": accounts }),
        )
        .await?;
        Ok(())
    }

    async fn get_message_detail(
        &self,
        account_email: &str,
        message_id: &str,
    ) -> Result<Option<CachedMessageDetail>> {
        let value = self
            .call(
                "query",
                "emailCache:getMessageDetail",
                json!({ "accountEmail": account_email, "messageId": message_id }),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn upsert_message_detail(
        &self,
        account_email: &str,
        message_id: &str,
        from: &str,
        subject: &str,
        date: &str,
        preview: &str,
        body_text: &str,
        body_html: &str,
        body: &str,
        sort_time: i64,
    ) -> Result<()> {
        self.call(
            "mutation",
            "emailCache:upsertMessageDetail",
            json!({
                "accountEmail": account_email,
                "messageId": message_id,
                "from": from,
                "subject": subject,
                "date": date,
                "preview": preview,
                "bodyText": body_text,
                "bodyHtml": body_html,
                "body": body,
                "sortTime": sort_time,
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_inbox_snapshot_decodes_value() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/query")
            .match_body(mockito::Matcher::PartialJson(json!({
                "path": "emailCache:getInboxSnapshot",
                "args": {"maxResults": 25},
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "status": "success",
                    "value": {
                        "messages": [{
                            "id": "a@x.com:1",
                            "messageId": "1",
                            "accountEmail": "a@x.com",
                            "from": "Alice <alice@x.com>",
                            "subject": "Hi",
                            "date": "Tue, 1 Jul 2025 13:43:00 +0000",
                            "preview": "hello"
                        }],
                        "accounts": [{
                            "id": "acct_a",
                            "email": "a@x.com",
                            "messagesTotal": 10,
                            "threadsTotal": 7
                        }]
                    }
                }"#,
            )
            .create_async()
            .await;

        let cache = ConvexCache::new(Client::new(), server.url());
        let snapshot = cache.get_inbox_snapshot(25).await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].id, "a@x.com:1");
        assert_eq!(snapshot.accounts[0].messages_total, 10);
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "error", "errorMessage": "Function not found"}"#)
            .create_async()
            .await;

        let cache = ConvexCache::new(Client::new(), server.url());
        let err = cache.get_inbox_snapshot(25).await.unwrap_err();
        assert!(err.to_string().contains("Function not found"));
    }

    #[tokio::test]
    async fn test_get_message_detail_null_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/query")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "success", "value": null}"#)
            .create_async()
            .await;

        let cache = ConvexCache::new(Client::new(), server.url());
        let detail = cache.get_message_detail("a@x.com", "1").await.unwrap();
        assert!(detail.is_none());
    }

    #[test]
    fn test_has_body() {
        let mut detail = CachedMessageDetail {
            id: "a@x.com:1".to_string(),
            message_id: "1".to_string(),
            account_email: "a@x.com".to_string(),
            from: "".to_string(),
            subject: "".to_string(),
            date: "".to_string(),
            preview: "".to_string(),
            body_text: None,
            body_html: None,
            body: None,
        };
        assert!(!detail.has_body());

        detail.body_text = Some("".to_string());
        assert!(!detail.has_body());

        detail.body_html = Some("<p>hi</p>".to_string());
        assert!(detail.has_body());
    }
}
