//! Public types for the message detail API
use serde::Deserialize;

#[derive(Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "messageId")]
    pub message_id: Option<String>,
    #[serde(rename = "accountEmail")]
    pub account_email: Option<String>,
}
