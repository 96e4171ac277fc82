//! Connected-account registry and token freshness management.
//!
//! The registry is shared mutable state across concurrent requests, so
//! it lives behind an async lock and is passed explicitly through app
//! state rather than a process-global. Token refreshes are serialized
//! per account to keep concurrent requests from issuing duplicate
//! refresh calls against the provider.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};

use crate::core::AppConfig;
use crate::google::oauth::{TOKEN_EXPIRY_MARGIN_MS, refresh_access_token};

#[derive(Clone, Debug)]
pub struct GmailAccount {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, epoch milliseconds
    pub expires_at: i64,
}

impl GmailAccount {
    pub fn is_active(&self) -> bool {
        Utc::now().timestamp_millis() < self.expires_at
    }
}

/// In-memory registry of connected accounts, keyed by lowercased email.
#[derive(Clone, Default)]
pub struct AccountStore {
    accounts: Arc<RwLock<Vec<GmailAccount>>>,
    refresh_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<GmailAccount> {
        self.accounts.read().await.clone()
    }

    pub async fn get_by_email(&self, email: &str) -> Option<GmailAccount> {
        let key = email.to_lowercase();
        self.accounts
            .read()
            .await
            .iter()
            .find(|account| account.email.to_lowercase() == key)
            .cloned()
    }

    /// Insert or replace the record for the account's email. There is
    /// exactly one record per normalized email.
    pub async fn add_or_update(&self, account: GmailAccount) {
        let key = account.email.to_lowercase();
        let mut accounts = self.accounts.write().await;
        if let Some(existing) = accounts
            .iter_mut()
            .find(|stored| stored.email.to_lowercase() == key)
        {
            *existing = account;
        } else {
            accounts.push(account);
        }
    }

    pub async fn remove_by_email(&self, email: &str) {
        let key = email.to_lowercase();
        self.accounts
            .write()
            .await
            .retain(|account| account.email.to_lowercase() != key);
        // Also drop the per-email refresh lock so the map doesn't grow
        // with every email ever connected
        self.refresh_locks.lock().await.remove(&key);
    }

    async fn refresh_lock_for(&self, email: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(email.to_lowercase())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Return a usable access token for the account, refreshing it when
    /// within the expiry margin. The refreshed token replaces the stored
    /// record atomically, keyed by email.
    pub async fn ensure_fresh_token(
        &self,
        http: &Client,
        config: &AppConfig,
        email: &str,
    ) -> Result<String> {
        let lock = self.refresh_lock_for(email).await;
        let _guard = lock.lock().await;

        let account = self
            .get_by_email(email)
            .await
            .ok_or_else(|| anyhow!("Account not found: {}", email))?;

        if Utc::now().timestamp_millis() < account.expires_at - TOKEN_EXPIRY_MARGIN_MS {
            return Ok(account.access_token);
        }

        let client_id = config.oauth_client_id.clone().unwrap_or_default();
        let client_secret = config.oauth_client_secret.clone().unwrap_or_default();
        let refreshed = refresh_access_token(
            http,
            &config.google_token_url,
            &client_id,
            &client_secret,
            &account.refresh_token,
        )
        .await?;

        let updated = GmailAccount {
            access_token: refreshed.access_token.clone(),
            expires_at: refreshed.expires_at,
            ..account
        };
        self.add_or_update(updated).await;

        Ok(refreshed.access_token)
    }
}
