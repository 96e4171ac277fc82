//! Public types for the saved custom inbox API
use serde::{Deserialize, Serialize};

use crate::inbox::custom::{CustomInbox, CustomInboxFilters, InboxFilterLogic};

#[derive(Serialize)]
pub struct InboxesResponse {
    pub inboxes: Vec<CustomInbox>,
}

#[derive(Deserialize)]
pub struct CreateInboxRequest {
    pub name: Option<String>,
    pub pinned: Option<bool>,
    pub logic: Option<InboxFilterLogic>,
    pub filters: Option<CustomInboxFilters>,
}
