//! Opening the panel database and handing out repositories over it.

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;
use crate::repository::{
    SurrealOAuth2ClientRepository, SurrealPermissionRepository, SurrealSessionRepository,
    SurrealUserRepository,
};
use crate::schema::run_migrations;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub root_user: String,
    pub root_password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:8000".into(),
            namespace: "panel".into(),
            database: "panel".into(),
            root_user: "root".into(),
            root_password: "root".into(),
        }
    }
}

/// A migrated database handle. Cloning is cheap; every repository shares
/// the same underlying connection.
#[derive(Clone)]
pub struct DbManager<C: Connection = Client> {
    db: Surreal<C>,
}

impl DbManager<Client> {
    /// Open a WebSocket connection as the root user, then [`attach`](Self::attach).
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(endpoint = %config.endpoint, "opening SurrealDB connection");

        let db = Surreal::new::<Ws>(config.endpoint.as_str()).await?;
        db.signin(Root {
            username: config.root_user.clone(),
            password: config.root_password.clone(),
        })
        .await?;

        Self::attach(db, config).await
    }
}

impl<C: Connection> DbManager<C> {
    /// Point an already-open handle at the configured namespace and
    /// database and apply pending migrations.
    pub async fn attach(db: Surreal<C>, config: &DbConfig) -> Result<Self, DbError> {
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;
        run_migrations(&db).await?;

        info!(
            namespace = %config.namespace,
            database = %config.database,
            "panel database ready"
        );
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<C> {
        &self.db
    }

    pub fn users(&self) -> SurrealUserRepository<C> {
        SurrealUserRepository::new(self.db.clone())
    }

    pub fn sessions(&self) -> SurrealSessionRepository<C> {
        SurrealSessionRepository::new(self.db.clone())
    }

    pub fn clients(&self) -> SurrealOAuth2ClientRepository<C> {
        SurrealOAuth2ClientRepository::new(self.db.clone())
    }

    pub fn permissions(&self) -> SurrealPermissionRepository<C> {
        SurrealPermissionRepository::new(self.db.clone())
    }
}
