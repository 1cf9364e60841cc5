//! Self-service for the signed-in user: profile, password and personal
//! OAuth2 clients.

use panel_core::error::{PanelError, PanelResult};
use panel_core::models::oauth2_client::{CreateOAuth2Client, CreatedClient, OAuth2Client};
use panel_core::models::user::{UpdateUser, User, UserView};
use panel_core::repository::{OAuth2ClientRepository, UserRepository};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::{Notification, NotificationQueue, Template};
use crate::password;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSelf {
    pub username: String,
    pub email: String,
    /// Current password, required to change anything.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl UpdateSelf {
    fn validate(&self, config: &AuthConfig) -> PanelResult<()> {
        if self.username.trim().is_empty() {
            return Err(PanelError::Validation {
                message: "username must not be empty".into(),
            });
        }
        if !self.email.contains('@') {
            return Err(PanelError::Validation {
                message: "email is not valid".into(),
            });
        }
        if let Some(new_password) = self.new_password() {
            if new_password.chars().count() < config.min_password_length {
                return Err(PanelError::Validation {
                    message: format!(
                        "password must be at least {} characters",
                        config.min_password_length
                    ),
                });
            }
        }
        Ok(())
    }

    fn new_password(&self) -> Option<&str> {
        self.new_password.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub struct AccountService<U, C> {
    users: U,
    clients: C,
    notifications: NotificationQueue,
    config: AuthConfig,
}

impl<U, C> AccountService<U, C>
where
    U: UserRepository,
    C: OAuth2ClientRepository,
{
    pub fn new(users: U, clients: C, notifications: NotificationQueue, config: AuthConfig) -> Self {
        Self {
            users,
            clients,
            notifications,
            config,
        }
    }

    pub fn get_self(&self, user: &User) -> UserView {
        UserView::from(user)
    }

    pub async fn update_self(&self, user: &User, input: UpdateSelf) -> PanelResult<UserView> {
        input.validate(&self.config)?;
        if input.password.is_empty() {
            return Err(PanelError::field_required("password"));
        }

        let pepper = self.config.pepper.as_deref();
        if !password::verify_password(&input.password, &user.password_hash, pepper)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let email_changed = input.email != user.email;
        let password_hash = input
            .new_password()
            .map(|p| password::hash_password(p, pepper))
            .transpose()?;
        let password_changed = password_hash.is_some();

        let updated = self
            .users
            .update(
                user.id,
                UpdateUser {
                    username: (input.username != user.username).then_some(input.username),
                    email: email_changed.then(|| input.email.clone()),
                    password_hash,
                    otp: None,
                },
            )
            .await?;

        info!(
            user_id = %updated.id,
            email_changed,
            password_changed,
            "account updated"
        );

        if email_changed {
            self.notifications.notify(
                Notification::new(&user.email, Template::EmailChanged)
                    .with_var("NEW_EMAIL", &updated.email),
            );
        }
        if password_changed {
            self.notifications
                .notify(Notification::new(&updated.email, Template::PasswordChanged));
        }

        Ok(UserView::from(&updated))
    }

    pub async fn list_personal_clients(&self, user: &User) -> PanelResult<Vec<OAuth2Client>> {
        let mut clients = self.clients.list_for_user(user.id).await?;
        clients.retain(|c| c.is_personal_for(user.id));
        Ok(clients)
    }

    /// The returned secret is never stored in plain text and cannot be
    /// shown again.
    pub async fn create_personal_client(
        &self,
        user: &User,
        request: CreateClientRequest,
    ) -> PanelResult<CreatedClient> {
        let client_id = Uuid::new_v4().to_string();
        let client_secret: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.config.client_secret_length)
            .map(char::from)
            .collect();
        let client_secret_hash =
            password::hash_password(&client_secret, self.config.pepper.as_deref())?;

        let client = self
            .clients
            .create(CreateOAuth2Client {
                client_id,
                client_secret_hash,
                user_id: user.id,
                server_id: None,
                name: request.name,
                description: request.description,
            })
            .await?;

        info!(user_id = %user.id, client_id = %client.client_id, "personal client created");
        self.notifications
            .notify(Notification::new(&user.email, Template::OAuthCreated));

        Ok(CreatedClient {
            client_id: client.client_id,
            client_secret,
        })
    }

    pub async fn delete_personal_client(&self, user: &User, client_id: &str) -> PanelResult<()> {
        let client = self.clients.get_by_client_id(client_id).await?;
        if !client.is_personal_for(user.id) {
            // Someone else's client is indistinguishable from a missing one.
            return Err(PanelError::not_found("oauth2_client", client_id));
        }

        self.clients.delete(&client.client_id).await?;

        info!(user_id = %user.id, client_id, "personal client deleted");
        self.notifications
            .notify(Notification::new(&user.email, Template::OAuthDeleted));
        Ok(())
    }
}
