//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub otp_enabled: bool,
    /// AES-256-GCM encrypted OTP secret (pending or active).
    pub otp_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Current position of the user in the OTP enrollment lifecycle.
    pub fn otp_enrollment(&self) -> OtpEnrollment {
        match (&self.otp_secret, self.otp_enabled) {
            (Some(secret), true) => OtpEnrollment::Enrolled(secret.clone()),
            (Some(secret), false) => OtpEnrollment::PendingSecret(secret.clone()),
            (None, _) => OtpEnrollment::NotEnrolled,
        }
    }
}

/// Per-user OTP state. Secret material only exists in the last two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpEnrollment {
    NotEnrolled,
    PendingSecret(String),
    Enrolled(String),
}

impl OtpEnrollment {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enrolled(_))
    }

    /// Storage representation: `(otp_enabled, otp_secret)`.
    pub fn into_parts(self) -> (bool, Option<String>) {
        match self {
            Self::NotEnrolled => (false, None),
            Self::PendingSecret(secret) => (false, Some(secret)),
            Self::Enrolled(secret) => (true, Some(secret)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(state)` replaces both OTP columns, `None` leaves them alone.
    pub otp: Option<OtpEnrollment>,
}

/// Public projection of a user, safe to return to the user themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(otp_enabled: bool, otp_secret: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            otp_enabled,
            otp_secret: otp_secret.map(Into::into),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn enrollment_is_derived_from_columns() {
        assert_eq!(user(false, None).otp_enrollment(), OtpEnrollment::NotEnrolled);
        assert_eq!(
            user(false, Some("s")).otp_enrollment(),
            OtpEnrollment::PendingSecret("s".into())
        );
        assert_eq!(
            user(true, Some("s")).otp_enrollment(),
            OtpEnrollment::Enrolled("s".into())
        );
        // An enabled flag without a secret cannot verify codes.
        assert_eq!(user(true, None).otp_enrollment(), OtpEnrollment::NotEnrolled);
    }

    #[test]
    fn into_parts_matches_storage_columns() {
        assert_eq!(OtpEnrollment::NotEnrolled.into_parts(), (false, None));
        assert_eq!(
            OtpEnrollment::PendingSecret("p".into()).into_parts(),
            (false, Some("p".into()))
        );
        assert_eq!(
            OtpEnrollment::Enrolled("e".into()).into_parts(),
            (true, Some("e".into()))
        );
    }

    #[test]
    fn view_uses_camel_case_and_hides_secrets() {
        let u = user(true, Some("secret"));
        let json = serde_json::to_value(UserView::from(&u)).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("otpSecret").is_none());
    }
}
