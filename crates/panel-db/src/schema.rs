//! Schema definitions and migration runner.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings and double as
//! record keys.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
-- Users
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD otp_enabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD otp_secret ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- Browser sessions
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token_hash ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- OAuth2 clients, keyed by client_id
DEFINE TABLE oauth2_client SCHEMAFULL;
DEFINE FIELD client_secret_hash ON TABLE oauth2_client TYPE string;
DEFINE FIELD user_id ON TABLE oauth2_client TYPE string;
DEFINE FIELD server_id ON TABLE oauth2_client TYPE option<string>;
DEFINE FIELD name ON TABLE oauth2_client TYPE string;
DEFINE FIELD description ON TABLE oauth2_client TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE oauth2_client TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_oauth2_client_user ON TABLE oauth2_client \
    COLUMNS user_id;

-- Scope grants, one row per (user, server); server NONE = global
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD user_id ON TABLE permission TYPE string;
DEFINE FIELD server_id ON TABLE permission TYPE option<string>;
DEFINE FIELD scopes ON TABLE permission TYPE array<string> DEFAULT [];
DEFINE INDEX idx_permission_user ON TABLE permission COLUMNS user_id;
";

/// Apply every migration newer than the recorded schema version.
///
/// Creates the `_migration` tracking table on first run, so calling this
/// on an up-to-date database is a no-op.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "v{} '{}': {e}",
                migration.version, migration.name
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("recording v{}: {e}", migration.version))
            })?;
    }

    Ok(())
}

/// Raw DDL for schema version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
