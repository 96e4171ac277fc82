use std::path::Path;
use std::sync::Arc;

use reqwest::Client;

use crate::accounts::AccountStore;
use crate::cache::{ConvexCache, SnapshotCache};
use crate::core::AppConfig;
use crate::inbox::custom::CustomInboxStore;

pub struct AppState {
    pub accounts: AccountStore,
    pub cache: Option<Arc<dyn SnapshotCache>>,
    pub custom_inboxes: CustomInboxStore,
    pub http: Client,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http = Client::new();
        let cache: Option<Arc<dyn SnapshotCache>> = config
            .convex_url
            .as_ref()
            .map(|url| Arc::new(ConvexCache::new(http.clone(), url.clone())) as Arc<dyn SnapshotCache>);
        let custom_inboxes =
            CustomInboxStore::new(Path::new(&config.storage_path).join("custom_inboxes.json"));

        Self {
            accounts: AccountStore::new(),
            cache,
            custom_inboxes,
            http,
            config,
        }
    }
}
