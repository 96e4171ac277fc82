//! API routes module

pub mod accounts;
pub mod auth;
pub mod inbox;
pub mod inboxes;
pub mod message;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Aggregate inbox listing
        .nest("/inbox", inbox::router())
        // Single message detail
        .nest("/message", message::router())
        // Connected account management
        .nest("/accounts", accounts::router())
        // OAuth login and callback
        .nest("/auth", auth::router())
        // Saved custom inbox views
        .nest("/inboxes", inboxes::router())
}
