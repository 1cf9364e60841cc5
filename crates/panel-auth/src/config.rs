//! Authentication configuration.

use std::fmt;

use jsonwebtoken::Algorithm;

/// Key material for signing and verifying access tokens.
#[derive(Clone)]
pub enum SigningKey {
    /// Shared secret for the HMAC algorithms (HS256/384/512).
    Secret(Vec<u8>),
    /// PEM-encoded key pair for the asymmetric algorithms
    /// (RS*/PS*, ES256/384, EdDSA).
    Pem {
        private_pem: String,
        public_pem: String,
    },
}

// Key material never appears in logs.
impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
            Self::Pem { public_pem, .. } => f
                .debug_struct("Pem")
                .field("private_pem", &"<redacted>")
                .field("public_pem", public_pem)
                .finish(),
        }
    }
}

impl SigningKey {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "shared-secret",
            Self::Pem { .. } => "PEM",
        }
    }
}

/// Algorithm and key used by the claim token codec.
///
/// Passed explicitly to every component that signs or verifies.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub algorithm: Algorithm,
    pub key: SigningKey,
}

impl SigningConfig {
    pub fn hmac(algorithm: Algorithm, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            key: SigningKey::Secret(secret.into()),
        }
    }

    pub fn pem(
        algorithm: Algorithm,
        private_pem: impl Into<String>,
        public_pem: impl Into<String>,
    ) -> Self {
        Self {
            algorithm,
            key: SigningKey::Pem {
                private_pem: private_pem.into(),
                public_pem: public_pem.into(),
            },
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self::hmac(Algorithm::HS256, Vec::new())
    }
}

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token signing algorithm and key.
    pub signing: SigningConfig,
    /// Session lifetime in seconds (default: 3600 = 1 hour). Also used as
    /// the cookie `Max-Age`.
    pub session_lifetime_secs: u64,
    /// Name of the session cookie. The companion expiry cookie is named
    /// `<name>_expires`.
    pub session_cookie_name: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Minimum length for a new password.
    pub min_password_length: usize,
    /// 256-bit AES-GCM key for encrypting OTP secrets at rest.
    /// `None` disables OTP enrollment.
    pub otp_encryption_key: Option<[u8; 32]>,
    /// Issuer name shown in authenticator apps.
    pub otp_issuer: String,
    /// Length of generated OAuth2 client secrets.
    pub client_secret_length: usize,
}

impl AuthConfig {
    pub fn session_expires_cookie_name(&self) -> String {
        format!("{}_expires", self.session_cookie_name)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing: SigningConfig::default(),
            session_lifetime_secs: 3600,
            session_cookie_name: "panel_auth".into(),
            pepper: None,
            min_password_length: 8,
            otp_encryption_key: None,
            otp_issuer: "Panel".into(),
            client_secret_length: 36,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let config = SigningConfig::hmac(Algorithm::HS256, b"do-not-print".to_vec());
        assert!(!format!("{config:?}").contains("do-not-print"));
    }

    #[test]
    fn expires_cookie_name_follows_session_cookie() {
        let config = AuthConfig::default();
        assert_eq!(config.session_expires_cookie_name(), "panel_auth_expires");
    }
}
