//! Router for the Google OAuth login and callback flow

use std::sync::{Arc, RwLock};

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Query;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use reqwest::Client;
use uuid::Uuid;

use super::public;
use crate::accounts::{AccountStore, GmailAccount};
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::google::gmail::fetch_account_email;
use crate::google::oauth::exchange_code_for_tokens;

type SharedState = Arc<RwLock<AppState>>;

const STATE_COOKIE: &str = "gmail_oauth_state";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const OAUTH_SCOPES: &str = "openid email profile https://www.googleapis.com/auth/gmail.readonly";

fn settings_error(code: &str) -> Redirect {
    Redirect::to(&format!("/settings?error={}", code))
}

fn settings_error_with_message(code: &str, message: &str) -> Redirect {
    Redirect::to(&format!(
        "/settings?error={}&message={}",
        code,
        urlencoding::encode(message)
    ))
}

async fn login_handler(State(state): State<SharedState>, jar: CookieJar) -> Response {
    let config = {
        let shared_state = state.read().expect("Unable to read shared state");
        shared_state.config.clone()
    };

    let oauth = match config.oauth_config() {
        Ok(oauth) => oauth,
        Err(error) => {
            return settings_error_with_message("oauth_config_missing", &error.to_string())
                .into_response();
        }
    };

    // Random state round-tripped through a short-lived cookie to tie
    // the callback to this browser session
    let oauth_state = Uuid::new_v4().to_string();
    let cookie = Cookie::build((STATE_COOKIE, oauth_state.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::minutes(10))
        .build();

    let authorize_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
        GOOGLE_AUTH_URL,
        urlencoding::encode(&oauth.client_id),
        urlencoding::encode(&oauth.redirect_uri),
        urlencoding::encode(OAUTH_SCOPES),
        urlencoding::encode(&oauth_state),
    );

    (jar.add(cookie), Redirect::to(&authorize_url)).into_response()
}

/// Exchange the authorization code and register the account. Returns
/// `false` when Google issued no refresh token for a brand-new account,
/// meaning the connection cannot survive the first expiry.
async fn connect_account(
    accounts: &AccountStore,
    http: &Client,
    config: &AppConfig,
    code: &str,
) -> Result<bool> {
    let oauth = config.oauth_config()?;
    let tokens = exchange_code_for_tokens(http, &config.google_token_url, &oauth, code).await?;
    let email =
        fetch_account_email(http, &config.gmail_api_base_url, &tokens.access_token).await?;

    let existing = accounts.get_by_email(&email).await;
    // Google only returns a refresh token on first consent; keep the
    // stored one on reconnect
    let refresh_token = tokens
        .refresh_token
        .or_else(|| existing.as_ref().map(|account| account.refresh_token.clone()))
        .filter(|token| !token.is_empty());

    let Some(refresh_token) = refresh_token else {
        return Ok(false);
    };

    let id = existing
        .map(|account| account.id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    accounts
        .add_or_update(GmailAccount {
            id,
            email,
            access_token: tokens.access_token,
            refresh_token,
            expires_at: tokens.expires_at,
        })
        .await;

    Ok(true)
}

async fn callback_handler(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(params): Query<public::CallbackQuery>,
) -> Response {
    let (accounts, http, config) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.accounts.clone(),
            shared_state.http.clone(),
            shared_state.config.clone(),
        )
    };

    let expected_state = jar
        .get(STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::from(STATE_COOKIE));

    if let Some(error) = params.error {
        return (jar, settings_error_with_message("oauth_denied", &error)).into_response();
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return (jar, settings_error("missing_code")).into_response();
    };

    let state_matches = matches!(
        (params.state.as_deref(), expected_state.as_deref()),
        (Some(received), Some(expected)) if received == expected
    );
    if !state_matches {
        return (jar, settings_error("invalid_state")).into_response();
    }

    match connect_account(&accounts, &http, &config, &code).await {
        Ok(true) => (jar, Redirect::to("/settings?connected=1")).into_response(),
        Ok(false) => (jar, settings_error("missing_refresh_token")).into_response(),
        Err(error) => {
            tracing::error!("OAuth callback failed: {}", error);
            (
                jar,
                settings_error_with_message("oauth_failed", &error.to_string()),
            )
                .into_response()
        }
    }
}

/// Create the auth router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", axum::routing::get(login_handler))
        .route("/callback", axum::routing::get(callback_handler))
}
