//! Minimal schema migrator.
//!
//! Reads `*.sql` files from `changesets_location`, sorted lexically, and
//! applies any whose index is past the `app.schema_version` row. This is a
//! from-scratch re-implementation of the original `data/migrator.go` /
//! `data/migration_repository.go` pair — out of scope for the core per the
//! spec, kept here as the ambient piece that makes `app.db` self-managing.

use std::path::Path;

use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::StoreError;

pub async fn ensure_schema_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS app (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL
         )",
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO app (id, schema_version) VALUES (1, 0)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    let row = sqlx::query("SELECT schema_version FROM app WHERE id = 1")
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("schema_version")?)
}

/// Apply every migration script in `changesets_dir` with an ordinal greater
/// than the current schema version. Scripts are named `NNNN_description.sql`
/// and sorted lexically, so zero-padding the ordinal keeps them in order.
pub async fn run(pool: &SqlitePool, changesets_dir: &Path) -> Result<(), StoreError> {
    ensure_schema_table(pool).await?;
    let version = current_version(pool).await?;

    let mut scripts: Vec<_> = std::fs::read_dir(changesets_dir)
        .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("sql"))
        .collect();
    scripts.sort();

    for (idx, path) in scripts.iter().enumerate() {
        let ordinal = (idx + 1) as i64;
        if ordinal <= version {
            continue;
        }

        let sql = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;

        log::info!("applying migration {}", path.display());

        let mut tx = pool.begin().await?;
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("UPDATE app SET schema_version = ?1 WHERE id = 1")
            .bind(ordinal)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
