//! SurrealDB implementation of [`PermissionRepository`].

use panel_core::error::PanelResult;
use panel_core::models::permission::Permissions;
use panel_core::repository::PermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, statement_error};

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    scopes: Vec<String>,
}

/// One grant row per `(user, server)`.
///
/// Global and server grants live under different prefixes, and the user id
/// has a fixed width, so no server name can land on another row's key.
fn record_key(user_id: Uuid, server_id: Option<&str>) -> String {
    match server_id {
        None => format!("global/{user_id}"),
        Some(server) => format!("server/{user_id}/{server}"),
    }
}

#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn get_for_user_and_server(
        &self,
        user_id: Uuid,
        server_id: Option<&str>,
    ) -> PanelResult<Permissions> {
        let mut result = self
            .db
            .query("SELECT scopes FROM type::record('permission', $key)")
            .bind(("key", record_key(user_id, server_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let scopes = rows.into_iter().next().map(|r| r.scopes).unwrap_or_default();

        Ok(Permissions {
            user_id,
            server_id: server_id.map(str::to_string),
            scopes,
        })
    }

    async fn put(&self, permissions: Permissions) -> PanelResult<Permissions> {
        let key = record_key(permissions.user_id, permissions.server_id.as_deref());

        self.db
            .query(
                "UPSERT type::record('permission', $key) SET \
                 user_id = $user_id, server_id = $server_id, scopes = $scopes",
            )
            .bind(("key", key))
            .bind(("user_id", permissions.user_id.to_string()))
            .bind(("server_id", permissions.server_id.clone()))
            .bind(("scopes", permissions.scopes.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| statement_error("permission", e))?;

        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_and_server_grants_have_distinct_keys() {
        let user = Uuid::new_v4();
        assert_ne!(record_key(user, None), record_key(user, Some("srv1")));
        assert_ne!(record_key(user, None), record_key(user, Some("*")));
        assert_ne!(record_key(user, None), record_key(user, Some("")));
    }

    #[test]
    fn server_names_cannot_reach_another_users_row() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let crafted = format!("x/{b}");
        assert_ne!(record_key(a, Some(&crafted)), record_key(b, Some("x")));
        assert_ne!(record_key(a, Some(&crafted)), record_key(b, None));
    }
}
