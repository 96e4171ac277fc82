//! Test utilities for integration tests
use std::env;
use std::fs;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use axum::{Router, body::Body};

use unibox::api::AppState;
use unibox::api::app;
use unibox::core::AppConfig;

/// A config pointed at a unique temp storage directory with no OAuth
/// credentials, no cache, and unroutable provider URLs. Tests that
/// stub the provider overwrite the URL fields with a mock server.
pub fn test_config() -> AppConfig {
    // Unique directory per test to avoid collisions between
    // concurrently running tests
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string();
    let dir = env::temp_dir().join(format!("unibox-test-{}", ts));
    fs::create_dir_all(&dir).expect("Failed to create base directory");

    AppConfig {
        storage_path: dir.display().to_string(),
        public_origin: "http://127.0.0.1:2222".to_string(),
        oauth_client_id: None,
        oauth_client_secret: None,
        oauth_redirect_uri: None,
        convex_url: None,
        google_token_url: "http://127.0.0.1:1/token".to_string(),
        gmail_api_base_url: "http://127.0.0.1:1/gmail".to_string(),
        account_fetch_timeout_secs: 20,
    }
}

/// Creates a test application router backed by a fresh state.
pub async fn test_app() -> Router {
    let (app, _state) = test_app_with_state(test_config()).await;
    app
}

/// Creates a test application router and returns the shared state so
/// tests can seed accounts directly.
pub async fn test_app_with_state(config: AppConfig) -> (Router, Arc<RwLock<AppState>>) {
    let app_state = AppState::new(config);
    let shared_state = Arc::new(RwLock::new(app_state));
    (app(Arc::clone(&shared_state)), shared_state)
}

/// Collect a response body into a string for assertions.
pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("Response body was not utf8")
}
