//! Google OAuth2 token endpoint client: authorization-code exchange
//! and refresh-token grants.

use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::core::OauthConfig;

/// Access tokens are treated as expired slightly early to absorb clock
/// skew and in-flight request latency.
pub const TOKEN_EXPIRY_MARGIN_MS: i64 = 30_000;

/// Fallback lifetime when the token response omits `expires_in`
const DEFAULT_TOKEN_TTL_SECS: i64 = 3500;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExchangedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_at: i64,
}

fn expiry_from_ttl(expires_in: Option<i64>) -> i64 {
    let ttl = match expires_in {
        Some(secs) if secs > 0 => secs,
        _ => DEFAULT_TOKEN_TTL_SECS,
    };
    Utc::now().timestamp_millis() + ttl * 1000
}

async fn post_token_request(
    http: &Client,
    token_url: &str,
    params: &[(&str, &str)],
    failure: &str,
) -> Result<TokenResponse> {
    let response = http.post(token_url).form(params).send().await?;
    let ok = response.status().is_success();
    let data: TokenResponse = response.json().await?;

    if !ok || data.access_token.is_none() {
        let message = data
            .error_description
            .or(data.error)
            .unwrap_or_else(|| failure.to_string());
        return Err(anyhow!(message));
    }

    Ok(data)
}

/// Exchange an authorization code for access and refresh tokens.
pub async fn exchange_code_for_tokens(
    http: &Client,
    token_url: &str,
    oauth: &OauthConfig,
    code: &str,
) -> Result<ExchangedTokens> {
    let params = [
        ("code", code),
        ("client_id", oauth.client_id.as_str()),
        ("client_secret", oauth.client_secret.as_str()),
        ("redirect_uri", oauth.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];
    let data = post_token_request(
        http,
        token_url,
        &params,
        "Failed to exchange authorization code.",
    )
    .await?;

    Ok(ExchangedTokens {
        access_token: data.access_token.unwrap_or_default(),
        refresh_token: data.refresh_token,
        expires_at: expiry_from_ttl(data.expires_in),
    })
}

/// Trade a refresh token for a fresh access token.
pub async fn refresh_access_token(
    http: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<RefreshedToken> {
    let params = [
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "refresh_token"),
    ];
    let data =
        post_token_request(http, token_url, &params, "Failed to refresh access token.").await?;

    Ok(RefreshedToken {
        access_token: data.access_token.unwrap_or_default(),
        expires_at: expiry_from_ttl(data.expires_in),
    })
}
