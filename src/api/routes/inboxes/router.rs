//! Router for saved custom inbox views

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::inbox::custom::{
    CustomInbox, CustomInboxFilters, InboxFilterLogic, create_custom_inbox_id,
    normalize_and_dedupe,
};

type SharedState = Arc<RwLock<AppState>>;

async fn list_handler(State(state): State<SharedState>) -> Json<public::InboxesResponse> {
    let store = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.custom_inboxes.clone()
    };

    Json(public::InboxesResponse {
        inboxes: store.load(),
    })
}

async fn create_handler(
    State(state): State<SharedState>,
    Json(request): Json<public::CreateInboxRequest>,
) -> Result<Response, ApiError> {
    let Some(name) = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing inbox name." })),
        )
            .into_response());
    };

    let store = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.custom_inboxes.clone()
    };

    let filters = request.filters.unwrap_or_default();
    let inbox = CustomInbox {
        id: create_custom_inbox_id(name),
        name: name.to_string(),
        pinned: request.pinned.unwrap_or(false),
        logic: request.logic.unwrap_or(InboxFilterLogic::And),
        filters: CustomInboxFilters {
            senders: normalize_and_dedupe(&filters.senders),
            topics: normalize_and_dedupe(&filters.topics),
            keywords: normalize_and_dedupe(&filters.keywords),
        },
        created_at: Utc::now().to_rfc3339(),
    };

    // Newest view first
    let mut inboxes = store.load();
    inboxes.insert(0, inbox.clone());
    store.save(&inboxes)?;

    Ok(Json(inbox).into_response())
}

/// Create the custom inboxes router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/",
        axum::routing::get(list_handler).post(create_handler),
    )
}
