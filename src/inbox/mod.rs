//! Aggregate inbox domain: normalized message records, the multi-account
//! aggregator, saved custom inbox views, and the client-style filter
//! query engine.

use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod custom;
pub mod normalize;
pub mod query;
pub mod time;

/// A listing row in the aggregate inbox. `id` is the composite
/// `accountEmail:providerMessageId` key, unique across accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessage {
    pub id: String,
    pub message_id: String,
    pub account_email: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub preview: String,
}

/// A listing row carrying its derived sort timestamp (epoch ms), used
/// between normalization, the merge sort, and the snapshot cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedMessage {
    pub id: String,
    pub message_id: String,
    pub account_email: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub preview: String,
    pub sort_time: i64,
}

impl MergedMessage {
    pub fn to_inbox_message(&self) -> InboxMessage {
        InboxMessage {
            id: self.id.clone(),
            message_id: self.message_id.clone(),
            account_email: self.account_email.clone(),
            from: self.from.clone(),
            subject: self.subject.clone(),
            date: self.date.clone(),
            preview: self.preview.clone(),
        }
    }
}

/// Per-account totals reported alongside the aggregate listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub messages_total: i64,
    pub threads_total: i64,
}

/// The synthetic all-accounts mailbox rollup shown in the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxProfile {
    pub email_address: String,
    pub messages_total: i64,
    pub threads_total: i64,
}

/// A fully resolved message including decoded bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: String,
    pub message_id: String,
    pub account_email: String,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub preview: String,
    pub body_text: String,
    pub body_html: String,
    pub body: String,
}
