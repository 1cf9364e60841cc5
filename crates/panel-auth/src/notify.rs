//! Post-commit email notifications.
//!
//! Services enqueue a [`Notification`] only after the state change it
//! describes has been persisted. A [`NotificationDispatcher`] drains the
//! queue on its own task; delivery failures are logged and dropped, so a
//! broken mail relay never fails the request that triggered the email.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Email templates known to the mail relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    EmailChanged,
    PasswordChanged,
    OtpEnabled,
    OtpDisabled,
    OAuthCreated,
    OAuthDeleted,
}

impl Template {
    pub fn key(self) -> &'static str {
        match self {
            Self::EmailChanged => "emailChanged",
            Self::PasswordChanged => "passwordChanged",
            Self::OtpEnabled => "otpEnabled",
            Self::OtpDisabled => "otpDisabled",
            Self::OAuthCreated => "oauthCreated",
            Self::OAuthDeleted => "oauthDeleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub address: String,
    pub template: Template,
    pub vars: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(address: impl Into<String>, template: Template) -> Self {
        Self {
            address: address.into(),
            template,
            vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Error)]
#[error("email delivery to {address} failed: {reason}")]
pub struct DeliveryError {
    pub address: String,
    pub reason: String,
}

pub trait EmailSender: Send + Sync + 'static {
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Sender that only logs. Used when no relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            to_email = %notification.address,
            template = notification.template.key(),
            vars = ?notification.vars,
            "email send stub"
        );
        Ok(())
    }
}

/// Producer side of the notification channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        let template = notification.template.key();
        if self.tx.send(notification).is_err() {
            warn!(template, "notification dropped: dispatcher is gone");
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u64,
    pub failed: u64,
}

pub struct NotificationDispatcher<E: EmailSender> {
    sender: E,
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl<E: EmailSender> NotificationDispatcher<E> {
    pub fn new(sender: E, rx: mpsc::UnboundedReceiver<Notification>) -> Self {
        Self { sender, rx }
    }

    /// Deliver until every queue handle has been dropped.
    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        while let Some(notification) = self.rx.recv().await {
            match self.sender.send(&notification).await {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        template = notification.template.key(),
                        error = %e,
                        "failed to send notification email"
                    );
                }
            }
        }
        stats
    }

    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }
}
