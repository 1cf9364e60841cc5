//! Permission domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scopes granted to a user, either globally (`server_id == None`) or on
/// a single server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub user_id: Uuid,
    pub server_id: Option<String>,
    pub scopes: Vec<String>,
}

impl Permissions {
    pub fn empty(user_id: Uuid, server_id: Option<String>) -> Self {
        Self {
            user_id,
            server_id,
            scopes: Vec::new(),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
