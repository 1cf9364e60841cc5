//! In-memory repositories and senders shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jsonwebtoken::Algorithm;
use panel_auth::config::{AuthConfig, SigningConfig};
use panel_auth::notify::{DeliveryError, EmailSender, Notification};
use panel_auth::password;
use panel_core::error::{PanelError, PanelResult};
use panel_core::models::oauth2_client::{CreateOAuth2Client, OAuth2Client};
use panel_core::models::permission::Permissions;
use panel_core::models::session::{CreateSession, Session};
use panel_core::models::user::{CreateUser, UpdateUser, User};
use panel_core::repository::{
    OAuth2ClientRepository, PermissionRepository, SessionRepository, UserRepository,
};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::mpsc::UnboundedReceiver;
use totp_rs::{Secret, TOTP};
use uuid::Uuid;

pub const ISSUER: &str = "Panel";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        signing: SigningConfig::hmac(Algorithm::HS256, b"integration-test-secret".to_vec()),
        otp_encryption_key: Some([7u8; 32]),
        min_password_length: 8,
        ..AuthConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemUsers {
    data: Arc<TokioMutex<HashMap<Uuid, User>>>,
}

impl UserRepository for MemUsers {
    async fn create(&self, input: CreateUser) -> PanelResult<User> {
        let mut data = self.data.lock().await;
        if data.values().any(|u| u.username == input.username) {
            return Err(PanelError::AlreadyExists {
                entity: "user".into(),
            });
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            otp_enabled: false,
            otp_secret: None,
            created_at: now,
            updated_at: now,
        };
        data.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> PanelResult<User> {
        self.data
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| PanelError::not_found("user", id.to_string()))
    }

    async fn get_by_username(&self, username: &str) -> PanelResult<User> {
        self.data
            .lock()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| PanelError::not_found("user", username))
    }

    async fn get_by_email(&self, email: &str) -> PanelResult<User> {
        self.data
            .lock()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PanelError::not_found("user", email))
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> PanelResult<User> {
        let mut data = self.data.lock().await;
        let user = data
            .get_mut(&id)
            .ok_or_else(|| PanelError::not_found("user", id.to_string()))?;
        if let Some(username) = input.username {
            user.username = username;
        }
        if let Some(email) = input.email {
            user.email = email;
        }
        if let Some(hash) = input.password_hash {
            user.password_hash = hash;
        }
        if let Some(otp) = input.otp {
            let (enabled, secret) = otp.into_parts();
            user.otp_enabled = enabled;
            user.otp_secret = secret;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> PanelResult<()> {
        self.data
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PanelError::not_found("user", id.to_string()))
    }
}

pub async fn seed_user(users: &MemUsers, username: &str, password: &str) -> User {
    users
        .create(CreateUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: password::hash_password(password, None).unwrap(),
        })
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemSessions {
    data: Arc<TokioMutex<HashMap<Uuid, Session>>>,
}

impl MemSessions {
    pub async fn len(&self) -> usize {
        self.data.lock().await.len()
    }

    /// Move a session's expiry, for expiry tests.
    pub async fn set_expiry(&self, id: Uuid, expires_at: chrono::DateTime<Utc>) {
        if let Some(session) = self.data.lock().await.get_mut(&id) {
            session.expires_at = expires_at;
        }
    }
}

impl SessionRepository for MemSessions {
    async fn create(&self, input: CreateSession) -> PanelResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        self.data.lock().await.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> PanelResult<Session> {
        self.data
            .lock()
            .await
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned()
            .ok_or_else(|| PanelError::not_found("session", token_hash))
    }

    async fn invalidate(&self, id: Uuid) -> PanelResult<()> {
        self.data.lock().await.remove(&id);
        Ok(())
    }

    async fn invalidate_user_sessions(&self, user_id: Uuid) -> PanelResult<()> {
        self.data.lock().await.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> PanelResult<u64> {
        let now = Utc::now();
        let mut data = self.data.lock().await;
        let before = data.len();
        data.retain(|_, s| !s.is_expired(now));
        Ok((before - data.len()) as u64)
    }
}

/// Session store that refuses every write.
#[derive(Clone, Default)]
pub struct BrokenSessions;

impl SessionRepository for BrokenSessions {
    async fn create(&self, _input: CreateSession) -> PanelResult<Session> {
        Err(PanelError::Database("connection reset".into()))
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> PanelResult<Session> {
        Err(PanelError::not_found("session", token_hash))
    }

    async fn invalidate(&self, _id: Uuid) -> PanelResult<()> {
        Err(PanelError::Database("connection reset".into()))
    }

    async fn invalidate_user_sessions(&self, _user_id: Uuid) -> PanelResult<()> {
        Err(PanelError::Database("connection reset".into()))
    }

    async fn cleanup_expired(&self) -> PanelResult<u64> {
        Err(PanelError::Database("connection reset".into()))
    }
}

// ---------------------------------------------------------------------------
// OAuth2 clients
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemClients {
    data: Arc<TokioMutex<HashMap<String, OAuth2Client>>>,
}

impl OAuth2ClientRepository for MemClients {
    async fn create(&self, input: CreateOAuth2Client) -> PanelResult<OAuth2Client> {
        let mut data = self.data.lock().await;
        if data.contains_key(&input.client_id) {
            return Err(PanelError::AlreadyExists {
                entity: "oauth2_client".into(),
            });
        }
        let client = OAuth2Client {
            client_id: input.client_id,
            client_secret_hash: input.client_secret_hash,
            user_id: input.user_id,
            server_id: input.server_id,
            name: input.name,
            description: input.description,
            created_at: Utc::now(),
        };
        data.insert(client.client_id.clone(), client.clone());
        Ok(client)
    }

    async fn get_by_client_id(&self, client_id: &str) -> PanelResult<OAuth2Client> {
        self.data
            .lock()
            .await
            .get(client_id)
            .cloned()
            .ok_or_else(|| PanelError::not_found("oauth2_client", client_id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> PanelResult<Vec<OAuth2Client>> {
        let mut clients: Vec<_> = self
            .data
            .lock()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    async fn delete(&self, client_id: &str) -> PanelResult<()> {
        self.data
            .lock()
            .await
            .remove(client_id)
            .map(|_| ())
            .ok_or_else(|| PanelError::not_found("oauth2_client", client_id))
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemPermissions {
    data: Arc<TokioMutex<HashMap<(Uuid, Option<String>), Permissions>>>,
}

impl PermissionRepository for MemPermissions {
    async fn get_for_user_and_server(
        &self,
        user_id: Uuid,
        server_id: Option<&str>,
    ) -> PanelResult<Permissions> {
        let key = (user_id, server_id.map(str::to_string));
        Ok(self
            .data
            .lock()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Permissions::empty(user_id, key.1.clone())))
    }

    async fn put(&self, permissions: Permissions) -> PanelResult<Permissions> {
        let key = (permissions.user_id, permissions.server_id.clone());
        self.data.lock().await.insert(key, permissions.clone());
        Ok(permissions)
    }
}

#[derive(Clone, Default)]
pub struct BrokenPermissions;

impl PermissionRepository for BrokenPermissions {
    async fn get_for_user_and_server(
        &self,
        _user_id: Uuid,
        _server_id: Option<&str>,
    ) -> PanelResult<Permissions> {
        Err(PanelError::Database("permission store unavailable".into()))
    }

    async fn put(&self, _permissions: Permissions) -> PanelResult<Permissions> {
        Err(PanelError::Database("permission store unavailable".into()))
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingSender {
    pub sent: Arc<TokioMutex<Vec<Notification>>>,
}

impl EmailSender for RecordingSender {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FailingSender;

impl EmailSender for FailingSender {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError {
            address: notification.address.clone(),
            reason: "relay refused connection".into(),
        })
    }
}

/// Everything enqueued so far, without a dispatcher.
pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        out.push(notification);
    }
    out
}

// ---------------------------------------------------------------------------
// TOTP
// ---------------------------------------------------------------------------

fn authenticator(secret_base32: &str, account: &str) -> TOTP {
    let bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .unwrap();
    TOTP::new(
        totp_rs::Algorithm::SHA1,
        6,
        1,
        30,
        bytes,
        Some(ISSUER.into()),
        account.into(),
    )
    .unwrap()
}

/// What an authenticator app would show right now.
pub fn code_for(secret_base32: &str, account: &str) -> String {
    authenticator(secret_base32, account).generate_current().unwrap()
}

/// A well-formed code that matches no step inside the accepted window.
pub fn wrong_code_for(secret_base32: &str, account: &str) -> String {
    let totp = authenticator(secret_base32, account);
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    let nearby: Vec<String> = [now.saturating_sub(60), now - 30, now, now + 30, now + 60]
        .iter()
        .map(|t| totp.generate(*t))
        .collect();
    (0..1_000_000u32)
        .map(|n| format!("{n:06}"))
        .find(|c| !nearby.contains(c))
        .unwrap()
}
