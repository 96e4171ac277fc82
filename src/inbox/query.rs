//! Structured filter query parsing and matching. Queries mix free text
//! with `from:`, `message:`, and `time:` tags; quoted spans survive as
//! single terms.

use chrono::{DateTime, Local};

use super::InboxMessage;
use super::custom::parse_sender;
use super::normalize::derive_sort_time;
use super::time::{format_display_date, is_time_keyword, matches_time_tag};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub from: Vec<String>,
    pub message: Vec<String>,
    pub time: Vec<String>,
    pub general: Vec<String>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.from.is_empty()
            && self.message.is_empty()
            && self.time.is_empty()
            && self.general.is_empty()
    }
}

/// Split on whitespace, keeping double-quoted spans intact (quotes
/// stripped). Quotes may appear mid-token, e.g. `message:"failed build"`.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Parse a filter query into per-tag term buckets. Tokens without a
/// recognized `key:` prefix (including a leading `:`) become general
/// terms, except bare time keywords (`today`, `week`, ...), which
/// route to the time bucket as if tagged; all terms are lowercased and
/// trimmed.
pub fn parse_query(text: &str) -> ParsedQuery {
    let mut query = ParsedQuery::default();

    for token in tokenize(text) {
        let tagged = match token.find(':') {
            Some(position) if position > 0 => {
                let (key, value) = token.split_at(position);
                let value = value[1..].trim().to_lowercase();
                match key.to_lowercase().as_str() {
                    "from" => Some((&mut query.from, value)),
                    "message" => Some((&mut query.message, value)),
                    "time" => Some((&mut query.time, value)),
                    _ => None,
                }
            }
            _ => None,
        };

        match tagged {
            Some((bucket, value)) => {
                if !value.is_empty() {
                    bucket.push(value);
                }
            }
            None => {
                let value = token.trim().to_lowercase();
                if value.is_empty() {
                    continue;
                }
                if is_time_keyword(&value) {
                    query.time.push(value);
                } else {
                    query.general.push(value);
                }
            }
        }
    }

    query
}

/// Evaluate a parsed query against a message. Non-empty buckets are
/// combined with AND; every term in a bucket must match. An empty
/// query matches everything.
pub fn matches_query(message: &InboxMessage, query: &ParsedQuery, now: DateTime<Local>) -> bool {
    if query.is_empty() {
        return true;
    }

    let sender = parse_sender(&message.from).to_lowercase();
    let content = format!("{} {}", message.subject, message.preview).to_lowercase();

    // Finite only when the date header parses; fallback timestamps are
    // unavailable at this layer
    let sort_time = derive_sort_time(&message.date, None);
    let has_timestamp = sort_time != 0;

    if !query.from.iter().all(|term| sender.contains(term.as_str())) {
        return false;
    }

    if !query.message.iter().all(|term| content.contains(term.as_str())) {
        return false;
    }

    if !query.general.is_empty() {
        let display_date = if has_timestamp {
            format_display_date(sort_time, now)
        } else {
            message.date.clone()
        };
        let haystack = format!("{} {} {}", sender, content, display_date.to_lowercase());
        if !query.general.iter().all(|term| haystack.contains(term.as_str())) {
            return false;
        }
    }

    if !query.time.is_empty() {
        if !has_timestamp {
            return false;
        }
        if !query
            .time
            .iter()
            .all(|term| matches_time_tag(term, sort_time, now))
        {
            return false;
        }
    }

    true
}
