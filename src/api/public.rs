//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

// Errors

pub struct ApiError(anyhow::Error);

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        tracing::error!("{}", self.0);

        // Respond with an error status
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self.0),
        )
            .into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod accounts {
    pub use crate::api::routes::accounts::public::*;
}

pub mod auth {
    pub use crate::api::routes::auth::public::*;
}

pub mod inbox {
    pub use crate::api::routes::inbox::public::*;
}

pub mod inboxes {
    pub use crate::api::routes::inboxes::public::*;
}

pub mod message {
    pub use crate::api::routes::message::public::*;
}
