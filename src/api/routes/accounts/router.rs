//! Router for listing and disconnecting accounts

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::Query;
use serde_json::json;

use super::public;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

async fn list_handler(State(state): State<SharedState>) -> Json<public::AccountsResponse> {
    let accounts = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.accounts.clone()
    };

    let accounts = accounts
        .list()
        .await
        .into_iter()
        .map(|account| public::ConnectedAccount {
            status: if account.is_active() {
                "Active"
            } else {
                "Inactive"
            },
            id: account.id,
            email: account.email,
        })
        .collect();

    Json(public::AccountsResponse { accounts })
}

async fn remove_handler(
    State(state): State<SharedState>,
    Query(params): Query<public::RemoveAccountQuery>,
) -> Response {
    let Some(email) = params.email.filter(|email| !email.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing account email." })),
        )
            .into_response();
    };

    let accounts = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.accounts.clone()
    };
    accounts.remove_by_email(&email).await;

    StatusCode::NO_CONTENT.into_response()
}

/// Create the accounts router
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/",
        axum::routing::get(list_handler).delete(remove_handler),
    )
}
