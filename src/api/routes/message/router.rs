//! Router for fetching a single message with decoded bodies

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::Query;
use chrono::Utc;
use serde_json::json;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::google::gmail::{
    decode_base64_url, fetch_message_full, find_part_by_mime, get_header,
};
use crate::inbox::normalize::{
    FALLBACK_DATE, FALLBACK_SENDER, FALLBACK_SUBJECT, composite_id, derive_sort_time,
};
use crate::inbox::MessageDetail;

type SharedState = Arc<RwLock<AppState>>;

const FALLBACK_BODY: &str = "(No message body available)";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn message_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::MessageQuery>,
) -> Result<Response, ApiError> {
    let (Some(message_id), Some(account_email)) = (params.message_id, params.account_email) else {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            "Missing messageId or accountEmail.",
        ));
    };

    let (accounts, cache, http, config) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.accounts.clone(),
            shared_state.cache.clone(),
            shared_state.http.clone(),
            shared_state.config.clone(),
        )
    };

    // Cache-first: only a record with a populated body counts; a
    // listing-only record still needs the live fetch
    if let Some(cache) = &cache {
        match cache.get_message_detail(&account_email, &message_id).await {
            Ok(Some(cached)) if cached.has_body() => {
                let detail = MessageDetail {
                    id: cached.id,
                    message_id: cached.message_id,
                    account_email: cached.account_email,
                    from: cached.from,
                    subject: cached.subject,
                    date: cached.date,
                    preview: cached.preview,
                    body_text: cached.body_text.unwrap_or_default(),
                    body_html: cached.body_html.unwrap_or_default(),
                    body: cached.body.unwrap_or_default(),
                };
                return Ok(Json(detail).into_response());
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("Message detail cache read failed: {}", error);
            }
        }
    }

    if accounts.get_by_email(&account_email).await.is_none() {
        return Ok(error_response(StatusCode::NOT_FOUND, "Account not found."));
    }

    let access_token = accounts
        .ensure_fresh_token(&http, &config, &account_email)
        .await?;
    let message =
        fetch_message_full(&http, &config.gmail_api_base_url, &access_token, &message_id).await?;

    let payload = message.payload.as_ref();
    let headers = payload.and_then(|payload| payload.headers.as_deref());
    let parts = payload.and_then(|payload| payload.parts.as_deref());

    // Single-part messages carry their content in the top-level body;
    // multipart messages need a part walk
    let top_level_body = payload
        .and_then(|payload| payload.body.as_ref())
        .and_then(|body| body.data.as_deref())
        .map(decode_base64_url)
        .unwrap_or_default();

    let body_text = if top_level_body.is_empty() {
        find_part_by_mime(parts, "text/plain")
    } else {
        top_level_body
    };
    let body_html = find_part_by_mime(parts, "text/html");

    let snippet = message.snippet.clone().unwrap_or_default();
    let body = if !body_text.trim().is_empty() {
        body_text.clone()
    } else if !snippet.is_empty() {
        snippet.clone()
    } else {
        FALLBACK_BODY.to_string()
    };

    let date = get_header(headers, "date", FALLBACK_DATE);
    let detail = MessageDetail {
        id: composite_id(&account_email, &message_id),
        message_id: message_id.clone(),
        account_email: account_email.clone(),
        from: get_header(headers, "from", FALLBACK_SENDER),
        subject: get_header(headers, "subject", FALLBACK_SUBJECT),
        date: date.clone(),
        preview: snippet,
        body_text,
        body_html,
        body,
    };

    if let Some(cache) = &cache {
        let mut sort_time = derive_sort_time(&date, message.internal_date.as_deref());
        if sort_time == 0 {
            sort_time = Utc::now().timestamp_millis();
        }
        if let Err(error) = cache
            .upsert_message_detail(
                &detail.account_email,
                &detail.message_id,
                &detail.from,
                &detail.subject,
                &detail.date,
                &detail.preview,
                &detail.body_text,
                &detail.body_html,
                &detail.body,
                sort_time,
            )
            .await
        {
            tracing::warn!("Message detail cache write failed: {}", error);
        }
    }

    Ok(Json(detail).into_response())
}

/// Create the message router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::get(message_handler))
}
