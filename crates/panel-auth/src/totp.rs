//! TOTP secrets, codes and AES-256-GCM encryption of secrets at rest.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::AuthError;

const NONCE_LEN: usize = 12;

/// Encrypt a TOTP secret with AES-256-GCM.
///
/// Returns `base64(nonce || ciphertext || tag)`.
pub fn encrypt_secret(key: &[u8; 32], plaintext: &[u8]) -> Result<String, AuthError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| AuthError::Crypto(format!("AES-GCM encrypt: {e}")))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(combined))
}

pub fn decrypt_secret(key: &[u8; 32], encoded: &str) -> Result<Vec<u8>, AuthError> {
    let combined = STANDARD
        .decode(encoded)
        .map_err(|e| AuthError::Crypto(format!("base64 decode: {e}")))?;

    if combined.len() <= NONCE_LEN {
        return Err(AuthError::Crypto("ciphertext too short".into()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| AuthError::Crypto(format!("AES-GCM decrypt: {e}")))
}

/// A freshly generated TOTP secret, ready to show to the user.
#[derive(Debug, Clone)]
pub struct Enrollment {
    /// Raw secret bytes. Encrypt before persisting.
    pub secret_bytes: Vec<u8>,
    /// Base32 form for manual entry.
    pub secret_base32: String,
    /// `otpauth://totp/...` provisioning URI.
    pub uri: String,
    /// QR code of the provisioning URI as a `data:image/png;base64,` URL.
    pub qr_data_url: String,
}

// Authenticator labels use ':' as the issuer separator.
fn label(account: &str) -> String {
    account.replace(':', "_")
}

fn build(secret_bytes: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes,
        Some(issuer.to_string()),
        label(account),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

pub fn generate_enrollment(issuer: &str, account: &str) -> Result<Enrollment, AuthError> {
    let secret = Secret::generate_secret();
    let secret_bytes = secret
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("secret bytes: {e}")))?;

    let totp = build(secret_bytes.clone(), issuer, account)?;
    let png = totp
        .get_qr_base64()
        .map_err(|e| AuthError::Crypto(format!("QR render: {e}")))?;

    Ok(Enrollment {
        secret_base32: totp.get_secret_base32(),
        uri: totp.get_url(),
        qr_data_url: format!("data:image/png;base64,{png}"),
        secret_bytes,
    })
}

/// Check a code against the current step, allowing one step of skew.
pub fn verify_code(
    secret_bytes: &[u8],
    code: &str,
    issuer: &str,
    account: &str,
) -> Result<bool, AuthError> {
    build(secret_bytes.to_vec(), issuer, account)?
        .check_current(code.trim())
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

/// Current code for a secret.
pub fn current_code(secret_bytes: &[u8], issuer: &str, account: &str) -> Result<String, AuthError> {
    build(secret_bytes.to_vec(), issuer, account)?
        .generate_current()
        .map_err(|e| AuthError::Crypto(format!("TOTP generate: {e}")))
}
