//! Authentication error types.

use panel_core::error::PanelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("signing error: {0}")]
    Signing(String),

    #[error("token issuance failed: {0}")]
    Issuance(#[source] Box<AuthError>),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("OTP is already enabled")]
    OtpAlreadyEnabled,

    #[error("no OTP enrollment is pending")]
    OtpNotPending,

    #[error("OTP is not enabled for this user")]
    OtpNotEnrolled,

    #[error("OTP enrollment is not configured")]
    OtpUnavailable,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for PanelError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedToken(_) | AuthError::InvalidSignature | AuthError::ExpiredToken => {
                PanelError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::InvalidCredentials => PanelError::InvalidCredentials,
            AuthError::OtpAlreadyEnabled | AuthError::OtpNotPending | AuthError::OtpNotEnrolled => {
                PanelError::Conflict {
                    reason: err.to_string(),
                }
            }
            AuthError::Signing(msg) | AuthError::Crypto(msg) => PanelError::Crypto(msg),
            AuthError::Issuance(_) | AuthError::OtpUnavailable => {
                PanelError::Internal(err.to_string())
            }
        }
    }
}
