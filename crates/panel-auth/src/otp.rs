//! OTP enrollment lifecycle.
//!
//! ```text
//! NotEnrolled --start_enroll--> PendingSecret --validate_enroll--> Enrolled
//!                                   ^    |                            |
//!                                   +----+ start_enroll (new secret)  |
//! NotEnrolled <------------------------ disable ----------------------+
//! ```
//!
//! Every transition out of `PendingSecret` or `Enrolled` requires a valid
//! code for the stored secret. A wrong code leaves the state untouched.

use panel_core::error::PanelResult;
use panel_core::models::user::{OtpEnrollment, UpdateUser, User};
use panel_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::{Notification, NotificationQueue, Template};
use crate::totp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpStatus {
    pub otp_enabled: bool,
}

/// Shown once when enrollment starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpSecret {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `data:image/png;base64,` QR code of the provisioning URI.
    pub img: String,
}

pub struct OtpService<U> {
    users: U,
    notifications: NotificationQueue,
    config: AuthConfig,
}

impl<U: UserRepository> OtpService<U> {
    pub fn new(users: U, notifications: NotificationQueue, config: AuthConfig) -> Self {
        Self {
            users,
            notifications,
            config,
        }
    }

    fn key(&self) -> Result<&[u8; 32], AuthError> {
        self.config
            .otp_encryption_key
            .as_ref()
            .ok_or(AuthError::OtpUnavailable)
    }

    fn check_code(&self, user: &User, encrypted: &str, code: &str) -> Result<(), AuthError> {
        let secret = totp::decrypt_secret(self.key()?, encrypted)?;
        if totp::verify_code(&secret, code, &self.config.otp_issuer, &user.username)? {
            Ok(())
        } else {
            warn!(user_id = %user.id, "rejected OTP code");
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn store(&self, user_id: Uuid, state: OtpEnrollment) -> PanelResult<User> {
        self.users
            .update(
                user_id,
                UpdateUser {
                    otp: Some(state),
                    ..UpdateUser::default()
                },
            )
            .await
    }

    pub async fn status(&self, user_id: Uuid) -> PanelResult<OtpStatus> {
        let user = self.users.get_by_id(user_id).await?;
        Ok(OtpStatus {
            otp_enabled: user.otp_enrollment().is_enabled(),
        })
    }

    /// Generate a new secret and park it as pending. Restarting replaces
    /// a previous pending secret.
    pub async fn start_enroll(&self, user_id: Uuid) -> PanelResult<OtpSecret> {
        let key = self.key()?;
        let user = self.users.get_by_id(user_id).await?;
        if user.otp_enrollment().is_enabled() {
            return Err(AuthError::OtpAlreadyEnabled.into());
        }

        let enrollment = totp::generate_enrollment(&self.config.otp_issuer, &user.username)?;
        let encrypted = totp::encrypt_secret(key, &enrollment.secret_bytes)?;
        self.store(user.id, OtpEnrollment::PendingSecret(encrypted))
            .await?;

        info!(user_id = %user.id, "OTP enrollment started");

        Ok(OtpSecret {
            secret: enrollment.secret_base32,
            img: enrollment.qr_data_url,
        })
    }

    pub async fn validate_enroll(&self, user_id: Uuid, code: &str) -> PanelResult<()> {
        let user = self.users.get_by_id(user_id).await?;
        let OtpEnrollment::PendingSecret(encrypted) = user.otp_enrollment() else {
            return Err(AuthError::OtpNotPending.into());
        };

        self.check_code(&user, &encrypted, code)?;
        let user = self
            .store(user.id, OtpEnrollment::Enrolled(encrypted))
            .await?;

        info!(user_id = %user.id, "OTP enabled");
        self.notifications
            .notify(Notification::new(&user.email, Template::OtpEnabled));
        Ok(())
    }

    pub async fn disable(&self, user_id: Uuid, code: &str) -> PanelResult<()> {
        let user = self.users.get_by_id(user_id).await?;
        let OtpEnrollment::Enrolled(encrypted) = user.otp_enrollment() else {
            return Err(AuthError::OtpNotEnrolled.into());
        };

        self.check_code(&user, &encrypted, code)?;
        let user = self.store(user.id, OtpEnrollment::NotEnrolled).await?;

        info!(user_id = %user.id, "OTP disabled");
        self.notifications
            .notify(Notification::new(&user.email, Template::OtpDisabled));
        Ok(())
    }
}
