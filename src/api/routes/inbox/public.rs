//! Public types for the inbox listing API
use serde::{Deserialize, Serialize};

use crate::inbox::{AccountSummary, InboxMessage, InboxProfile};

#[derive(Deserialize)]
pub struct InboxQuery {
    #[serde(rename = "maxResults")]
    pub max_results: Option<i64>,
    /// Active view: `important`, `other`, or a custom inbox id
    pub inbox: Option<String>,
    /// Structured filter query (`from:`, `message:`, `time:`, free text)
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct InboxResponse {
    pub profile: InboxProfile,
    pub messages: Vec<InboxMessage>,
    pub accounts: Vec<AccountSummary>,
    pub source: &'static str,
}
