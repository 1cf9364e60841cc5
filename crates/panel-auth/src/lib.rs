//! Panel Auth — access token issuance and verification, browser sessions,
//! OTP enrollment and account self-service.

pub mod account;
pub mod config;
pub mod error;
pub mod issuer;
pub mod notify;
pub mod otp;
pub mod password;
pub mod session;
pub mod token;
pub mod totp;

pub use config::{AuthConfig, SigningConfig, SigningKey};
pub use error::AuthError;
pub use issuer::{IssuedTokens, TokenIssuer, TokenMeta};
pub use notify::{EmailSender, LogEmailSender, NotificationDispatcher, NotificationQueue};
pub use otp::{OtpSecret, OtpService, OtpStatus};
pub use session::{LoginResponse, Reauthentication, SessionCookie, SessionService};
pub use token::AccessTokenClaims;
