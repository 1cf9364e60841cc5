//! SurrealDB implementation of [`OAuth2ClientRepository`].
//!
//! The client id is the record key.

use chrono::{DateTime, Utc};
use panel_core::error::PanelResult;
use panel_core::models::oauth2_client::{CreateOAuth2Client, OAuth2Client};
use panel_core::repository::OAuth2ClientRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, statement_error};

#[derive(Debug, SurrealValue)]
struct ClientRow {
    client_secret_hash: String,
    user_id: String,
    server_id: Option<String>,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ClientRowWithId {
    record_id: String,
    client_secret_hash: String,
    user_id: String,
    server_id: Option<String>,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl ClientRow {
    fn try_into_client(self, client_id: String) -> Result<OAuth2Client, DbError> {
        Ok(OAuth2Client {
            client_id,
            client_secret_hash: self.client_secret_hash,
            user_id: parse_uuid("user", &self.user_id)?,
            server_id: self.server_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

impl ClientRowWithId {
    fn try_into_client(self) -> Result<OAuth2Client, DbError> {
        ClientRow {
            client_secret_hash: self.client_secret_hash,
            user_id: self.user_id,
            server_id: self.server_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
        .try_into_client(self.record_id)
    }
}

#[derive(Clone)]
pub struct SurrealOAuth2ClientRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOAuth2ClientRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OAuth2ClientRepository for SurrealOAuth2ClientRepository<C> {
    async fn create(&self, input: CreateOAuth2Client) -> PanelResult<OAuth2Client> {
        let client_id = input.client_id;

        let result = self
            .db
            .query(
                "CREATE type::record('oauth2_client', $client_id) SET \
                 client_secret_hash = $client_secret_hash, \
                 user_id = $user_id, server_id = $server_id, \
                 name = $name, description = $description",
            )
            .bind(("client_id", client_id.clone()))
            .bind(("client_secret_hash", input.client_secret_hash))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("server_id", input.server_id))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| statement_error("oauth2_client", e))?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "oauth2_client".into(),
            id: client_id.clone(),
        })?;

        Ok(row.try_into_client(client_id)?)
    }

    async fn get_by_client_id(&self, client_id: &str) -> PanelResult<OAuth2Client> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('oauth2_client', $client_id)")
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "oauth2_client".into(),
            id: client_id.to_string(),
        })?;

        Ok(row.try_into_client(client_id.to_string())?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> PanelResult<Vec<OAuth2Client>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM oauth2_client \
                 WHERE user_id = $user_id ORDER BY name",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRowWithId> = result.take(0).map_err(DbError::from)?;
        let clients = rows
            .into_iter()
            .map(ClientRowWithId::try_into_client)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }

    async fn delete(&self, client_id: &str) -> PanelResult<()> {
        let mut result = self
            .db
            .query("DELETE type::record('oauth2_client', $client_id) RETURN BEFORE")
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClientRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "oauth2_client".into(),
                id: client_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
