//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations own atomicity:
//! the services issue read-modify-write sequences and trust the store's
//! update semantics when two requests race on the same record.

use uuid::Uuid;

use crate::error::PanelResult;
use crate::models::{
    oauth2_client::{CreateOAuth2Client, OAuth2Client},
    permission::Permissions,
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = PanelResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PanelResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = PanelResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = PanelResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = PanelResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PanelResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession) -> impl Future<Output = PanelResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = PanelResult<Session>> + Send;
    /// Invalidate a single session.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = PanelResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g., on password change).
    fn invalidate_user_sessions(&self, user_id: Uuid)
    -> impl Future<Output = PanelResult<()>> + Send;
    /// Remove all expired sessions, returning how many were removed.
    fn cleanup_expired(&self) -> impl Future<Output = PanelResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// OAuth2 clients
// ---------------------------------------------------------------------------

pub trait OAuth2ClientRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOAuth2Client,
    ) -> impl Future<Output = PanelResult<OAuth2Client>> + Send;
    fn get_by_client_id(
        &self,
        client_id: &str,
    ) -> impl Future<Output = PanelResult<OAuth2Client>> + Send;
    /// All clients owned by a user, server-bound or not.
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = PanelResult<Vec<OAuth2Client>>> + Send;
    fn delete(&self, client_id: &str) -> impl Future<Output = PanelResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Permission resolver keyed by user identity.
pub trait PermissionRepository: Send + Sync {
    /// Scopes granted to `user_id` on `server_id`, or globally when
    /// `server_id` is `None`. A user with no grants gets an empty set.
    fn get_for_user_and_server(
        &self,
        user_id: Uuid,
        server_id: Option<&str>,
    ) -> impl Future<Output = PanelResult<Permissions>> + Send;
    /// Replace the grant row for `(user_id, server_id)`.
    fn put(&self, permissions: Permissions) -> impl Future<Output = PanelResult<Permissions>> + Send;
}
