//! Converts raw provider messages into canonical listing records.

use chrono::DateTime;

use super::MergedMessage;
use crate::google::gmail::{Message, get_header};

const PREVIEW_MAX_CHARS: usize = 400;

pub const FALLBACK_SENDER: &str = "(Unknown Sender)";
pub const FALLBACK_SUBJECT: &str = "(No Subject)";
pub const FALLBACK_DATE: &str = "(No Date)";
pub const FALLBACK_PREVIEW: &str = "(No body preview)";

/// Composite key guaranteeing cross-account uniqueness even when two
/// providers reuse message ids.
pub fn composite_id(account_email: &str, message_id: &str) -> String {
    format!("{}:{}", account_email, message_id)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Derive the ordering timestamp (epoch ms): the parsed `Date` header
/// when it parses, else the provider's internal timestamp, else 0.
pub fn derive_sort_time(date_header: &str, internal_date: Option<&str>) -> i64 {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(date_header.trim()) {
        return parsed.timestamp_millis();
    }

    internal_date
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Build a listing record from a metadata-only fetch. Returns `None`
/// when the provider response carries no message id.
pub fn normalize_metadata(account_email: &str, message: &Message) -> Option<MergedMessage> {
    let message_id = message.id.clone()?;
    let headers = message
        .payload
        .as_ref()
        .and_then(|payload| payload.headers.as_deref());

    let date_header = get_header(headers, "date", "");
    let sort_time = derive_sort_time(&date_header, message.internal_date.as_deref());

    let preview = message
        .snippet
        .clone()
        .filter(|snippet| !snippet.is_empty())
        .unwrap_or_else(|| FALLBACK_PREVIEW.to_string());

    Some(MergedMessage {
        id: composite_id(account_email, &message_id),
        message_id,
        account_email: account_email.to_string(),
        from: get_header(headers, "from", FALLBACK_SENDER),
        subject: get_header(headers, "subject", FALLBACK_SUBJECT),
        date: if date_header.is_empty() {
            FALLBACK_DATE.to_string()
        } else {
            date_header
        },
        preview: truncate_chars(&preview, PREVIEW_MAX_CHARS),
        sort_time,
    })
}
