//! User-defined saved inbox views: filter rule evaluation and the
//! versioned on-disk list they persist to.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::InboxMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboxFilterLogic {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomInboxFilters {
    pub senders: Vec<String>,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomInbox {
    pub id: String,
    pub name: String,
    pub pinned: bool,
    pub logic: InboxFilterLogic,
    pub filters: CustomInboxFilters,
    pub created_at: String,
}

fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

/// The sender display portion of a `From` header: everything before the
/// angle-bracketed address.
pub fn parse_sender(from: &str) -> String {
    from.split('<').next().unwrap_or(from).trim().to_string()
}

/// Trim terms and drop empties and case-insensitive duplicates,
/// preserving the first spelling of each.
pub fn normalize_and_dedupe(values: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut output = Vec::new();
    for value in values {
        let trimmed = value.trim();
        let key = trimmed.to_lowercase();
        if trimmed.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        output.push(trimmed.to_string());
    }
    output
}

/// Generate a view id: a slugified name (capped at 42 chars, `inbox`
/// when nothing survives slugification) plus a short random suffix.
pub fn create_custom_inbox_id(name: &str) -> String {
    let slug: String = normalize_text(name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(42)
        .collect();

    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(5).collect();
    if slug.is_empty() {
        format!("inbox-{}", suffix)
    } else {
        format!("{}-{}", slug, suffix)
    }
}

fn match_any(terms: &[String], source: &str) -> bool {
    let normalized: Vec<String> = terms
        .iter()
        .map(|term| normalize_text(term))
        .filter(|term| !term.is_empty())
        .collect();
    if normalized.is_empty() {
        return false;
    }
    normalized.iter().any(|term| source.contains(term.as_str()))
}

/// Evaluate a saved view's filter rule against a message. Empty filter
/// categories contribute no check; a view with no categories at all
/// matches nothing.
pub fn matches_custom_inbox(message: &InboxMessage, inbox: &CustomInbox) -> bool {
    let sender = normalize_text(&parse_sender(&message.from));
    let subject = normalize_text(&message.subject);
    let preview = normalize_text(&message.preview);
    let content = format!("{} {}", subject, preview);

    let mut checks = Vec::new();
    if !inbox.filters.senders.is_empty() {
        checks.push(match_any(&inbox.filters.senders, &sender));
    }
    if !inbox.filters.topics.is_empty() {
        checks.push(match_any(&inbox.filters.topics, &subject));
    }
    if !inbox.filters.keywords.is_empty() {
        checks.push(match_any(&inbox.filters.keywords, &content));
    }

    if checks.is_empty() {
        return false;
    }

    match inbox.logic {
        InboxFilterLogic::Or => checks.iter().any(|check| *check),
        InboxFilterLogic::And => checks.iter().all(|check| *check),
    }
}

/// Whether any configured view claims the message. The complement is
/// the "Other" bucket.
pub fn matches_any_custom_inbox(message: &InboxMessage, inboxes: &[CustomInbox]) -> bool {
    inboxes.iter().any(|inbox| matches_custom_inbox(message, inbox))
}

/// Unique parsed senders across a listing, sorted, for filter-building
/// suggestions.
pub fn sender_suggestions(messages: &[InboxMessage]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for message in messages {
        let sender = parse_sender(&message.from);
        if !sender.is_empty() && !unique.contains(&sender) {
            unique.push(sender);
        }
    }
    unique.sort();
    unique
}

pub const CUSTOM_INBOX_LIST_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CustomInboxList {
    version: u32,
    inboxes: Vec<Value>,
}

/// Versioned on-disk list of saved views. Malformed entries are
/// filtered out on load, and a missing or corrupt file reads as an
/// empty list.
#[derive(Clone, Debug)]
pub struct CustomInboxStore {
    path: PathBuf,
}

impl CustomInboxStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Vec<CustomInbox> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        let Ok(list) = serde_json::from_str::<CustomInboxList>(&raw) else {
            return Vec::new();
        };
        if list.version != CUSTOM_INBOX_LIST_VERSION {
            return Vec::new();
        }

        list.inboxes
            .into_iter()
            .filter(|entry| {
                entry.get("id").and_then(Value::as_str).is_some()
                    && entry.get("name").and_then(Value::as_str).is_some()
            })
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    pub fn save(&self, inboxes: &[CustomInbox]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let list = CustomInboxList {
            version: CUSTOM_INBOX_LIST_VERSION,
            inboxes: inboxes
                .iter()
                .map(|inbox| serde_json::to_value(inbox))
                .collect::<Result<Vec<_>, _>>()?,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&list)?)?;
        Ok(())
    }
}
