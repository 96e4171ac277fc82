//! Public types for the connected accounts API
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct ConnectedAccount {
    pub id: String,
    pub email: String,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct AccountsResponse {
    pub accounts: Vec<ConnectedAccount>,
}

#[derive(Deserialize)]
pub struct RemoveAccountQuery {
    pub email: Option<String>,
}
