//! Schema versions for the cache database.
//!
//! `_migrations` records the highest schema version applied to a file. On
//! open, every newer script runs in order inside one connection call.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Schema scripts keyed by version, oldest first.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_generations.sql"))];

/// Bring the schema up to the newest version.
///
/// # Errors
///
/// `Error::MigrationFailed` names the version whose script was rejected.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            tracing::debug!(version, "applying cache schema version");
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
