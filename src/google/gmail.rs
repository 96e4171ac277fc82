//! Gmail API client for profile lookup, inbox listing, and message
//! fetches, plus MIME payload decoding helpers.

use anyhow::{Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Deserialize)]
pub struct GmailProfile {
    #[serde(rename = "emailAddress")]
    pub email_address: Option<String>,
    #[serde(rename = "messagesTotal")]
    pub messages_total: Option<i64>,
    #[serde(rename = "threadsTotal")]
    pub threads_total: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: Option<String>,
    pub snippet: Option<String>,
    #[serde(rename = "internalDate")]
    pub internal_date: Option<String>,
    pub payload: Option<MessagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub headers: Option<Vec<MessageHeader>>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub body: Option<MessagePartBody>,
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePartBody {
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageHeader {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Look up a header value case-insensitively, with a fallback when the
/// header is absent or empty.
pub fn get_header(headers: Option<&[MessageHeader]>, key: &str, fallback: &str) -> String {
    headers
        .and_then(|headers| {
            headers.iter().find(|header| {
                header
                    .name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(key))
            })
        })
        .and_then(|header| header.value.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Decode a base64url payload, tolerating padded and unpadded input.
/// Undecodable data yields an empty string rather than an error.
pub fn decode_base64_url(value: &str) -> String {
    let trimmed = value.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Find the first part with the given MIME type and return its decoded
/// body. Parts are walked preorder with an explicit worklist so deeply
/// nested multipart trees can't exhaust the stack. First match wins.
pub fn find_part_by_mime(parts: Option<&[MessagePart]>, mime: &str) -> String {
    let Some(parts) = parts else {
        return String::new();
    };

    let mut worklist: Vec<&MessagePart> = parts.iter().rev().collect();
    while let Some(part) = worklist.pop() {
        if part.mime_type.as_deref() == Some(mime)
            && let Some(data) = part.body.as_ref().and_then(|body| body.data.as_deref())
        {
            return decode_base64_url(data);
        }

        if let Some(children) = &part.parts {
            for child in children.iter().rev() {
                worklist.push(child);
            }
        }
    }

    String::new()
}

/// GET a Gmail API resource with a bearer token. Non-2xx responses bail
/// with the response text so callers see the provider's error message.
pub async fn gmail_get<T: DeserializeOwned>(http: &Client, url: &str, access_token: &str) -> Result<T> {
    let response = http.get(url).bearer_auth(access_token).send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        if text.is_empty() {
            bail!("Gmail request failed with status {}", status);
        }
        bail!(text);
    }

    Ok(response.json().await?)
}

pub async fn fetch_profile(http: &Client, base_url: &str, access_token: &str) -> Result<GmailProfile> {
    gmail_get(http, &format!("{}/profile", base_url), access_token).await
}

/// Resolve the authenticated account's email address from its profile.
pub async fn fetch_account_email(http: &Client, base_url: &str, access_token: &str) -> Result<String> {
    let profile = fetch_profile(http, base_url, access_token).await?;
    profile
        .email_address
        .ok_or_else(|| anyhow!("Could not fetch Google account email."))
}

/// List inbox message ids, newest first, up to `max_results`.
pub async fn list_inbox_message_ids(
    http: &Client,
    base_url: &str,
    access_token: &str,
    max_results: usize,
) -> Result<Vec<String>> {
    let url = format!(
        "{}/messages?labelIds=INBOX&maxResults={}",
        base_url, max_results
    );
    let list: ListMessagesResponse = gmail_get(http, &url, access_token).await?;

    Ok(list
        .messages
        .unwrap_or_default()
        .into_iter()
        .filter_map(|message| message.id)
        .collect())
}

/// Fetch a message's headers and snippet without its body.
pub async fn fetch_message_metadata(
    http: &Client,
    base_url: &str,
    access_token: &str,
    message_id: &str,
) -> Result<Message> {
    let url = format!("{}/messages/{}?format=metadata", base_url, message_id);
    gmail_get(http, &url, access_token).await
}

/// Fetch a full message including MIME parts.
pub async fn fetch_message_full(
    http: &Client,
    base_url: &str,
    access_token: &str,
    message_id: &str,
) -> Result<Message> {
    let url = format!("{}/messages/{}?format=full", base_url, message_id);
    gmail_get(http, &url, access_token).await
}
