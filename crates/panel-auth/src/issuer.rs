//! Access/refresh token issuance for OAuth2 clients.

use chrono::{DateTime, Duration, Utc};
use panel_core::models::oauth2_client::OAuth2Client;
use panel_core::models::user::User;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SigningConfig;
use crate::error::AuthError;
use crate::token::{self, AccessTokenClaims};

/// Grant metadata supplied by the OAuth2 flow.
#[derive(Debug, Clone)]
pub struct TokenMeta {
    pub created_at: DateTime<Utc>,
    pub expires_in: Duration,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    pub access_token: String,
    /// Empty when no refresh token was requested.
    pub refresh_token: String,
    pub expired_at: i64,
}

/// Stateless token issuer. Persisting the refresh → access mapping is
/// left to the OAuth2 token store that calls this.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    signing: SigningConfig,
}

impl TokenIssuer {
    pub fn new(signing: SigningConfig) -> Self {
        Self { signing }
    }

    pub fn signing(&self) -> &SigningConfig {
        &self.signing
    }

    pub fn issue(
        &self,
        client: &OAuth2Client,
        user: Option<&User>,
        meta: &TokenMeta,
        want_refresh: bool,
    ) -> Result<IssuedTokens, AuthError> {
        let user_id = user.map(|u| u.id.to_string());
        self.issue_for(&client.client_id, user_id.as_deref(), meta, want_refresh)
    }

    /// Issue for raw identifiers, without loading the client or user.
    pub fn issue_for(
        &self,
        client_id: &str,
        user_id: Option<&str>,
        meta: &TokenMeta,
        want_refresh: bool,
    ) -> Result<IssuedTokens, AuthError> {
        let expires = meta
            .created_at
            .checked_add_signed(meta.expires_in)
            .ok_or_else(|| {
                AuthError::Issuance(Box::new(AuthError::Signing(
                    "expiry out of range".into(),
                )))
            })?;

        let claims = AccessTokenClaims {
            client_id: client_id.to_string(),
            user_id: user_id.unwrap_or_default().to_string(),
            expired_at: expires.timestamp(),
            scopes: meta.scope.clone(),
        };

        let access_token = token::sign_access_token(&claims, &self.signing)
            .map_err(|e| AuthError::Issuance(Box::new(e)))?;

        let refresh_token = if want_refresh {
            token::derive_refresh_token(&access_token)
        } else {
            String::new()
        };

        debug!(
            client_id,
            user_id = user_id.unwrap_or_default(),
            expired_at = claims.expired_at,
            refresh = want_refresh,
            "access token issued"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expired_at: claims.expired_at,
        })
    }

    /// Verify a token previously issued under the same signing config.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessTokenClaims, AuthError> {
        token::verify_access_token(token, &self.signing, now)
    }
}
