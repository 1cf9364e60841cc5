//! Sessions keyed by UUID, looked up by the SHA-256 of their credential.

use chrono::{DateTime, Utc};
use panel_core::error::PanelResult;
use panel_core::models::session::{CreateSession, Session};
use panel_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid, statement_error};

/// Projection shared by every read: the record key comes back as a plain
/// string in `record_id`.
const SESSION_FIELDS: &str =
    "meta::id(id) AS record_id, user_id, token_hash, expires_at, created_at";

#[derive(Debug, SurrealValue)]
struct SessionRecord {
    record_id: String,
    user_id: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = DbError;

    fn try_from(record: SessionRecord) -> Result<Self, DbError> {
        Ok(Session {
            id: parse_uuid("session", &record.record_id)?,
            user_id: parse_uuid("user", &record.user_id)?,
            token_hash: record.token_hash,
            expires_at: record.expires_at,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct Purged {
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn single(records: Vec<SessionRecord>, what: &str) -> Result<Session, DbError> {
        records
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound {
                entity: "session".into(),
                id: what.into(),
            })?
            .try_into()
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> PanelResult<Session> {
        let id = Uuid::new_v4().to_string();

        let mut response = self
            .db
            .query(format!(
                "CREATE type::record('session', $id) \
                 SET user_id = $user_id, token_hash = $token_hash, expires_at = $expires_at \
                 RETURN {SESSION_FIELDS}"
            ))
            .bind(("id", id.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("session", e))?;

        let records: Vec<SessionRecord> = response.take(0).map_err(DbError::from)?;
        Ok(Self::single(records, &id)?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> PanelResult<Session> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {SESSION_FIELDS} FROM session WHERE token_hash = $hash LIMIT 1"
            ))
            .bind(("hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let records: Vec<SessionRecord> = response.take(0).map_err(DbError::from)?;
        // The hash is a credential; keep it out of error messages.
        Ok(Self::single(records, "by token hash")?)
    }

    async fn invalidate(&self, id: Uuid) -> PanelResult<()> {
        self.db
            .query("DELETE type::record('session', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("session", e))?;
        Ok(())
    }

    async fn invalidate_user_sessions(&self, user_id: Uuid) -> PanelResult<()> {
        self.db
            .query("DELETE session WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("session", e))?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> PanelResult<u64> {
        let mut response = self
            .db
            .query("DELETE session WHERE expires_at <= time::now() RETURN BEFORE")
            .await
            .map_err(DbError::from)?;

        let purged: Vec<Purged> = response.take(0).map_err(DbError::from)?;
        let oldest = purged.iter().map(|p| p.expires_at).min();
        debug!(count = purged.len(), oldest = ?oldest, "expired sessions purged");
        Ok(purged.len() as u64)
    }
}
