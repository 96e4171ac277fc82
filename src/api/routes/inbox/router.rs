//! Router for the aggregate inbox API

use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, response::Json};
use axum_extra::extract::Query;
use chrono::Local;

use super::public;
use crate::api::state::AppState;
use crate::inbox::aggregate::{DEFAULT_MAX_RESULTS, aggregate_inbox, clamp_max_results};
use crate::inbox::custom::{matches_any_custom_inbox, matches_custom_inbox};
use crate::inbox::query::{matches_query, parse_query};
use crate::inbox::{AccountSummary, InboxMessage, InboxProfile};

type SharedState = Arc<RwLock<AppState>>;

const ALL_ACCOUNTS_LABEL: &str = "All accounts";

fn all_accounts_profile(total: i64) -> InboxProfile {
    InboxProfile {
        email_address: ALL_ACCOUNTS_LABEL.to_string(),
        messages_total: total,
        threads_total: total,
    }
}

async fn inbox_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::InboxQuery>,
) -> Json<public::InboxResponse> {
    let (accounts, cache, custom_store, http, config) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.accounts.clone(),
            shared_state.cache.clone(),
            shared_state.custom_inboxes.clone(),
            shared_state.http.clone(),
            shared_state.config.clone(),
        )
    };

    let max_results = clamp_max_results(params.max_results.unwrap_or(DEFAULT_MAX_RESULTS));

    let mut source = "gmail-live";
    let mut messages: Vec<InboxMessage> = Vec::new();
    let mut summaries: Vec<AccountSummary> = Vec::new();
    let mut served_from_cache = false;

    // Cache-first: a non-empty cached snapshot short-circuits the live
    // fetch entirely
    if let Some(cache) = &cache {
        match cache.get_inbox_snapshot(max_results).await {
            Ok(snapshot) if !snapshot.messages.is_empty() => {
                messages = snapshot.messages;
                summaries = snapshot.accounts;
                source = "convex-cache";
                served_from_cache = true;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("Inbox snapshot read failed, falling back to live fetch: {}", error);
            }
        }
    }

    if !served_from_cache {
        let connected = accounts.list().await;
        if !connected.is_empty() {
            let result = aggregate_inbox(&accounts, &http, &config, max_results).await;

            if let Some(cache) = &cache
                && let Err(error) = cache
                    .upsert_inbox_snapshot(&result.messages, &result.accounts)
                    .await
            {
                // Never block an inbox response on the cache
                tracing::warn!("Inbox snapshot write failed: {}", error);
            }

            messages = result
                .messages
                .iter()
                .map(|message| message.to_inbox_message())
                .collect();
            summaries = result.accounts;
        }
    }

    let profile = all_accounts_profile(messages.len() as i64);

    // Partition by the active view, then filter within it
    if let Some(view) = params.inbox.as_deref() {
        let custom = custom_store.load();
        match view {
            "important" => {}
            "other" => {
                messages.retain(|message| !matches_any_custom_inbox(message, &custom));
            }
            id => {
                if let Some(inbox) = custom.iter().find(|inbox| inbox.id == id) {
                    messages.retain(|message| matches_custom_inbox(message, inbox));
                }
            }
        }
    }

    if let Some(q) = params.q.as_deref() {
        let query = parse_query(q);
        if !query.is_empty() {
            let now = Local::now();
            messages.retain(|message| matches_query(message, &query, now));
        }
    }

    Json(public::InboxResponse {
        profile,
        messages,
        accounts: summaries,
        source,
    })
}

/// Create the inbox router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::get(inbox_handler))
}
