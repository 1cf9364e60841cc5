//! Signed access-token claims, refresh token derivation and opaque session
//! credentials.
//!
//! Verification is split into two gates: [`decode_access_token`] checks the
//! signature, [`validate_claims`] checks expiry against a caller-supplied
//! clock. An expired but authentic token is therefore reported as
//! [`AuthError::ExpiredToken`], never as a forgery.

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use panel_core::models::scope;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{SigningConfig, SigningKey};
use crate::error::AuthError;

/// Claims carried by every access token.
///
/// Empty fields are omitted on the wire and default to empty on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    /// Expiration (Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expired_at: i64,
    /// Space- or comma-delimited scope identifiers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scopes: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl AccessTokenClaims {
    pub fn scope_set(&self) -> BTreeSet<&str> {
        scope::set(&self.scopes)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expired_at, 0)
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn is_ec(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::ES256 | Algorithm::ES384)
}

fn mismatch(config: &SigningConfig) -> AuthError {
    AuthError::Signing(format!(
        "{:?} cannot be used with {} key material",
        config.algorithm,
        config.key.kind()
    ))
}

// An empty HMAC key makes every token forgeable.
fn require_secret(secret: &[u8]) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Signing("empty HMAC secret".into()));
    }
    Ok(())
}

fn encoding_key(config: &SigningConfig) -> Result<EncodingKey, AuthError> {
    let alg = config.algorithm;
    match &config.key {
        SigningKey::Secret(secret) if is_hmac(alg) => {
            require_secret(secret)?;
            Ok(EncodingKey::from_secret(secret))
        }
        SigningKey::Pem { private_pem, .. } if is_rsa(alg) => {
            EncodingKey::from_rsa_pem(private_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad RSA private key: {e}")))
        }
        SigningKey::Pem { private_pem, .. } if is_ec(alg) => {
            EncodingKey::from_ec_pem(private_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad EC private key: {e}")))
        }
        SigningKey::Pem { private_pem, .. } if alg == Algorithm::EdDSA => {
            EncodingKey::from_ed_pem(private_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad Ed25519 private key: {e}")))
        }
        _ => Err(mismatch(config)),
    }
}

fn decoding_key(config: &SigningConfig) -> Result<DecodingKey, AuthError> {
    let alg = config.algorithm;
    match &config.key {
        SigningKey::Secret(secret) if is_hmac(alg) => {
            require_secret(secret)?;
            Ok(DecodingKey::from_secret(secret))
        }
        SigningKey::Pem { public_pem, .. } if is_rsa(alg) => {
            DecodingKey::from_rsa_pem(public_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad RSA public key: {e}")))
        }
        SigningKey::Pem { public_pem, .. } if is_ec(alg) => {
            DecodingKey::from_ec_pem(public_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad EC public key: {e}")))
        }
        SigningKey::Pem { public_pem, .. } if alg == Algorithm::EdDSA => {
            DecodingKey::from_ed_pem(public_pem.as_bytes())
                .map_err(|e| AuthError::Signing(format!("bad Ed25519 public key: {e}")))
        }
        _ => Err(mismatch(config)),
    }
}

/// Sign claims into a compact JWS (`header.payload.signature`).
pub fn sign_access_token(
    claims: &AccessTokenClaims,
    config: &SigningConfig,
) -> Result<String, AuthError> {
    let key = encoding_key(config)?;
    jsonwebtoken::encode(&Header::new(config.algorithm), claims, &key)
        .map_err(|e| AuthError::Signing(format!("JWT encode: {e}")))
}

/// Decode a token and check its signature. Expiry is *not* checked here.
///
/// A token without three segments or with an unreadable header is
/// [`AuthError::MalformedToken`]. Once the header parses, any failure to
/// authenticate the payload against the signature segment, including a
/// signature that is not valid base64url, is [`AuthError::InvalidSignature`]
/// regardless of the algorithm.
pub fn decode_access_token(
    token: &str,
    config: &SigningConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = decoding_key(config)?;

    if token.split('.').count() != 3 {
        return Err(AuthError::MalformedToken(
            "expected header.payload.signature".into(),
        ));
    }
    jsonwebtoken::decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    // Expiry lives in `expired_at` and is checked by `validate_claims`.
    let mut validation = Validation::new(config.algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
                AuthError::InvalidSignature
            }
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::RsaFailedSigning => AuthError::Signing(e.to_string()),
            _ => AuthError::MalformedToken(e.to_string()),
        })
}

/// Expiry gate: a token is live iff `now < expired_at`.
pub fn validate_claims(claims: &AccessTokenClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if now.timestamp() >= claims.expired_at {
        return Err(AuthError::ExpiredToken);
    }
    Ok(())
}

/// Check signature, then expiry.
pub fn verify_access_token(
    token: &str,
    config: &SigningConfig,
    now: DateTime<Utc>,
) -> Result<AccessTokenClaims, AuthError> {
    let claims = decode_access_token(token, config)?;
    validate_claims(&claims, now)?;
    Ok(claims)
}

/// Derive an opaque refresh token from a freshly signed access token.
///
/// A name-based (SHA-1) UUID over the access token bytes under a random
/// namespace, base64url without padding, uppercased. The namespace is new
/// on every call, so the result is neither reversible nor reproducible
/// from the access token alone.
pub fn derive_refresh_token(access_token: &str) -> String {
    let namespace = Uuid::new_v4();
    let derived = Uuid::new_v5(&namespace, access_token.as_bytes());
    URL_SAFE_NO_PAD
        .encode(derived.as_bytes())
        .to_ascii_uppercase()
}

/// Generate a cryptographically random opaque credential
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of an opaque credential, hex-encoded.
///
/// This is the value stored as `session.token_hash`.
pub fn hash_opaque_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
