//! Schema migrations.
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied on every [`Database::new`](crate::Database::new). Files are
//! append-only: a change to the schema is a new `NNN_description.sql`, never
//! an edit to one that has shipped, since sqlx refuses to start when an
//! applied migration's checksum no longer matches.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the store's schema is behind the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Applies whatever embedded migrations the store has not seen yet.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;

    let status = schema_status(pool).await?;
    info!(applied = status.applied, "Schema up to date");
    Ok(())
}

pub async fn schema_status(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(SchemaStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied as usize,
    })
}
