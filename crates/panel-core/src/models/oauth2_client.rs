//! OAuth2 client domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Client {
    pub client_id: String,
    pub client_secret_hash: String,
    pub user_id: Uuid,
    /// Server the client is bound to; `None` for account-level clients.
    pub server_id: Option<String>,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl OAuth2Client {
    /// Account-level client owned by `user_id`.
    pub fn is_personal_for(&self, user_id: Uuid) -> bool {
        self.user_id == user_id && self.server_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOAuth2Client {
    pub client_id: String,
    pub client_secret_hash: String,
    pub user_id: Uuid,
    pub server_id: Option<String>,
    pub name: String,
    pub description: String,
}

/// Returned exactly once, when the client is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedClient {
    pub client_id: String,
    pub client_secret: String,
}
