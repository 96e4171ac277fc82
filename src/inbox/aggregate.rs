//! Multi-account inbox aggregation: fetch every connected account's
//! inbox concurrently, normalize, and merge into one globally
//! time-ordered listing. One broken account never fails the aggregate.

use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use reqwest::Client;
use tokio::task::JoinSet;

use super::normalize::normalize_metadata;
use super::{AccountSummary, MergedMessage};
use crate::accounts::{AccountStore, GmailAccount};
use crate::core::AppConfig;
use crate::google::gmail;

pub const DEFAULT_MAX_RESULTS: i64 = 25;

/// Clamp the caller-supplied listing size to `[1, 100]`.
pub fn clamp_max_results(requested: i64) -> usize {
    requested.clamp(1, 100) as usize
}

#[derive(Debug, Default)]
pub struct AggregateResult {
    pub messages: Vec<MergedMessage>,
    pub accounts: Vec<AccountSummary>,
}

/// Merge per-account listings into one sequence sorted descending by
/// sort timestamp. The sort is stable; ties keep their relative order.
pub fn merge_and_sort(listings: Vec<Vec<MergedMessage>>) -> Vec<MergedMessage> {
    let mut merged: Vec<MergedMessage> = listings.into_iter().flatten().collect();
    merged.sort_by_key(|message| std::cmp::Reverse(message.sort_time));
    merged
}

async fn fetch_account_listing(
    store: AccountStore,
    http: Client,
    config: AppConfig,
    account: GmailAccount,
    max_results: usize,
) -> Result<(AccountSummary, Vec<MergedMessage>)> {
    let access_token = store
        .ensure_fresh_token(&http, &config, &account.email)
        .await?;
    let base_url = &config.gmail_api_base_url;

    let profile = gmail::fetch_profile(&http, base_url, &access_token).await?;
    let summary = AccountSummary {
        id: account.id.clone(),
        email: profile.email_address.unwrap_or_else(|| account.email.clone()),
        messages_total: profile.messages_total.unwrap_or(0),
        threads_total: profile.threads_total.unwrap_or(0),
    };

    let message_ids =
        gmail::list_inbox_message_ids(&http, base_url, &access_token, max_results).await?;

    // Metadata fetches run concurrently; results come back positionally
    let fetches = message_ids
        .iter()
        .map(|id| gmail::fetch_message_metadata(&http, base_url, &access_token, id));
    let details = join_all(fetches).await;

    let mut messages = Vec::new();
    for detail in details {
        let detail = detail?;
        if let Some(normalized) = normalize_metadata(&account.email, &detail) {
            messages.push(normalized);
        }
    }

    Ok((summary, messages))
}

/// Aggregate all connected accounts' inboxes. Accounts are fetched
/// concurrently and independently; a failed or timed-out account is
/// logged and dropped while the rest contribute normally.
pub async fn aggregate_inbox(
    store: &AccountStore,
    http: &Client,
    config: &AppConfig,
    max_results: usize,
) -> AggregateResult {
    let accounts = store.list().await;
    if accounts.is_empty() {
        return AggregateResult::default();
    }

    let timeout = Duration::from_secs(config.account_fetch_timeout_secs);
    let mut tasks = JoinSet::new();
    for account in accounts {
        let store = store.clone();
        let http = http.clone();
        let config = config.clone();
        let email = account.email.clone();
        tasks.spawn(async move {
            let result = tokio::time::timeout(
                timeout,
                fetch_account_listing(store, http, config, account, max_results),
            )
            .await;
            (email, result)
        });
    }

    let mut listings = Vec::new();
    let mut summaries = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let Ok((email, result)) = joined else {
            continue;
        };
        match result {
            Ok(Ok((summary, messages))) => {
                summaries.push(summary);
                listings.push(messages);
            }
            Ok(Err(error)) => {
                tracing::warn!("Dropping account {} from aggregation: {}", email, error);
            }
            Err(_) => {
                tracing::warn!("Dropping account {} from aggregation: fetch timed out", email);
            }
        }
    }

    AggregateResult {
        messages: merge_and_sort(listings),
        accounts: summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn merged(account: &str, message_id: &str, sort_time: i64) -> MergedMessage {
        MergedMessage {
            id: format!("{}:{}", account, message_id),
            message_id: message_id.to_string(),
            account_email: account.to_string(),
            from: "Someone <someone@example.com>".to_string(),
            subject: "Subject".to_string(),
            date: "(No Date)".to_string(),
            preview: "preview".to_string(),
            sort_time,
        }
    }

    #[test]
    fn test_clamp_max_results() {
        assert_eq!(clamp_max_results(-1), 1);
        assert_eq!(clamp_max_results(0), 1);
        assert_eq!(clamp_max_results(25), 25);
        assert_eq!(clamp_max_results(100), 100);
        assert_eq!(clamp_max_results(5000), 100);
    }

    #[test]
    fn test_merge_orders_descending_regardless_of_input_order() {
        let merged_result = merge_and_sort(vec![
            vec![merged("a@x.com", "1", 10), merged("a@x.com", "2", 50)],
            vec![merged("b@y.com", "1", 30)],
        ]);

        let order: Vec<i64> = merged_result.iter().map(|m| m.sort_time).collect();
        assert_eq!(order, vec![50, 30, 10]);
    }

    #[test]
    fn test_composite_ids_stay_unique_across_accounts() {
        // Both providers issued the numeric id "42"
        let merged_result = merge_and_sort(vec![
            vec![merged("a@x.com", "42", 2)],
            vec![merged("b@y.com", "42", 1)],
        ]);

        assert_eq!(merged_result[0].id, "a@x.com:42");
        assert_eq!(merged_result[1].id, "b@y.com:42");
    }

    #[test]
    fn test_two_account_timeline_interleaves() {
        let now = Utc::now().timestamp_millis();
        let account_a = vec![
            merged("a@x.com", "now", now),
            merged("a@x.com", "old", now - ChronoDuration::days(2).num_milliseconds()),
        ];
        let account_b = vec![merged(
            "b@y.com",
            "mid",
            now - ChronoDuration::days(1).num_milliseconds(),
        )];

        let merged_result = merge_and_sort(vec![account_a, account_b]);
        let ids: Vec<&str> = merged_result.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a@x.com:now", "b@y.com:mid", "a@x.com:old"]);
    }

    #[tokio::test]
    async fn test_failed_account_is_dropped_not_fatal() {
        let mut server = mockito::Server::new_async().await;

        // Account A's token is valid and its fetches succeed
        let _profile = server
            .mock("GET", "/profile")
            .match_header("authorization", "Bearer token_a")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"emailAddress": "a@x.com", "messagesTotal": 12, "threadsTotal": 8}"#)
            .create_async()
            .await;
        let _list = server
            .mock("GET", "/messages")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer token_a")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": [{"id": "msg_1"}]}"#)
            .create_async()
            .await;
        let _detail = server
            .mock("GET", "/messages/msg_1")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer token_a")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": "msg_1",
                    "snippet": "hello from a",
                    "internalDate": "1731401723000",
                    "payload": {"headers": [
                        {"name": "From", "value": "Alice <alice@x.com>"},
                        {"name": "Subject", "value": "Hi"},
                        {"name": "Date", "value": "Tue, 1 Jul 2025 13:43:00 +0000"}
                    ]}
                }"#,
            )
            .create_async()
            .await;

        // Account B's refresh fails at the token endpoint
        let _token = server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let store = AccountStore::new();
        let far_future = Utc::now().timestamp_millis() + 3_600_000;
        store
            .add_or_update(GmailAccount {
                id: "acct_a".to_string(),
                email: "a@x.com".to_string(),
                access_token: "token_a".to_string(),
                refresh_token: "refresh_a".to_string(),
                expires_at: far_future,
            })
            .await;
        store
            .add_or_update(GmailAccount {
                id: "acct_b".to_string(),
                email: "b@y.com".to_string(),
                access_token: "token_b".to_string(),
                refresh_token: "refresh_b".to_string(),
                // Expired, so B must refresh and that refresh fails
                expires_at: 0,
            })
            .await;

        let config = AppConfig {
            storage_path: "./".to_string(),
            public_origin: "http://127.0.0.1:2222".to_string(),
            oauth_client_id: Some("id".to_string()),
            oauth_client_secret: Some("secret".to_string()),
            oauth_redirect_uri: None,
            convex_url: None,
            google_token_url: format!("{}/token", server.url()),
            gmail_api_base_url: server.url(),
            account_fetch_timeout_secs: 20,
        };

        let result = aggregate_inbox(&store, &Client::new(), &config, 25).await;

        assert_eq!(result.accounts.len(), 1);
        assert_eq!(result.accounts[0].email, "a@x.com");
        assert_eq!(result.accounts[0].messages_total, 12);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].id, "a@x.com:msg_1");
        assert_eq!(result.messages[0].sort_time, 1751377380000);
    }
}
