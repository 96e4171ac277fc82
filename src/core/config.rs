use std::env;

use anyhow::{Result, anyhow};

/// Resolve the first non-empty environment variable from a list of
/// accepted names.
fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Directory for local state (saved custom inbox views)
    pub storage_path: String,
    /// Origin used to build the default OAuth redirect URI
    pub public_origin: String,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub oauth_redirect_uri: Option<String>,
    /// Convex deployment URL. Cache is disabled when unset.
    pub convex_url: Option<String>,
    pub google_token_url: String,
    pub gmail_api_base_url: String,
    /// Upper bound on one account's contribution to an aggregation pass
    pub account_fetch_timeout_secs: u64,
}

/// Validated OAuth client settings, required only by the auth flow.
#[derive(Clone, Debug)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl AppConfig {
    /// Resolve the OAuth client settings or fail with a message the
    /// auth routes surface to the user.
    pub fn oauth_config(&self) -> Result<OauthConfig> {
        let client_id = self
            .oauth_client_id
            .clone()
            .ok_or_else(|| anyhow!("Missing OAuth config: set GMAIL_CLIENT_ID (or GOOGLE_CLIENT_ID)."))?;
        let client_secret = self
            .oauth_client_secret
            .clone()
            .ok_or_else(|| anyhow!("Missing OAuth config: set GMAIL_CLIENT_SECRET (or GOOGLE_CLIENT_SECRET)."))?;
        let redirect_uri = self
            .oauth_redirect_uri
            .clone()
            .unwrap_or_else(|| format!("{}/api/auth/callback", self.public_origin));

        Ok(OauthConfig {
            client_id,
            client_secret,
            redirect_uri,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("UNIBOX_STORAGE_PATH").unwrap_or("./".to_string());
        let public_origin = env::var("UNIBOX_PUBLIC_ORIGIN")
            .unwrap_or_else(|_| "http://127.0.0.1:2222".to_string());
        let oauth_client_id = first_env(&[
            "GMAIL_CLIENT_ID",
            "GOOGLE_CLIENT_ID",
            "NEXT_PUBLIC_GOOGLE_CLIENT_ID",
        ]);
        let oauth_client_secret = first_env(&["GMAIL_CLIENT_SECRET", "GOOGLE_CLIENT_SECRET"]);
        let oauth_redirect_uri = first_env(&["GMAIL_REDIRECT_URI", "GOOGLE_REDIRECT_URI"]);
        let convex_url = first_env(&["CONVEX_URL", "NEXT_PUBLIC_CONVEX_URL"]);
        let google_token_url = env::var("GOOGLE_TOKEN_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string());
        let gmail_api_base_url = env::var("GMAIL_API_BASE_URL")
            .unwrap_or_else(|_| "https://gmail.googleapis.com/gmail/v1/users/me".to_string());
        let account_fetch_timeout_secs = env::var("UNIBOX_ACCOUNT_FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(20);

        Self {
            storage_path,
            public_origin,
            oauth_client_id,
            oauth_client_secret,
            oauth_redirect_uri,
            convex_url,
            google_token_url,
            gmail_api_base_url,
            account_fetch_timeout_secs,
        }
    }
}
