//! Bootstrap — C13. Directory init, `tmp/` wipe, migrations, cleanup task
//! startup. A from-scratch re-implementation of the original `bootstrap.go`.

use rdm_core::cleanup::CleanupQueue;
use rdm_core::error::fatal;
use rdm_core::store::migrate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::Config;

pub struct Bootstrapped {
    pub pool: SqlitePool,
    pub cleanup: CleanupQueue,
}

/// Wipe and recreate `tmp/`, ensure `storage/` exists, open the database,
/// run pending migrations, seed default settings if none exist, and start
/// the cleanup queue. Any failure here is fatal — the server cannot run in
/// a half-initialized state.
pub async fn run(config: &Config) -> Bootstrapped {
    let storage_dir = config.storage_dir();
    let tmp_dir = config.tmp_dir();

    if let Err(e) = tokio::fs::create_dir_all(&storage_dir).await {
        fatal(format!("failed to create storage dir {}: {e}", storage_dir.display()));
    }

    if tmp_dir.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(&tmp_dir).await {
            fatal(format!("failed to wipe tmp dir {}: {e}", tmp_dir.display()));
        }
    }
    if let Err(e) = tokio::fs::create_dir_all(&tmp_dir).await {
        fatal(format!("failed to create tmp dir {}: {e}", tmp_dir.display()));
    }

    let db_path = config.db_path();
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = match SqlitePoolOptions::new().connect(&db_url).await {
        Ok(pool) => pool,
        Err(e) => fatal(format!("failed to open database at {}: {e}", db_path.display())),
    };

    if let Err(e) = migrate::run(&pool, &config.changesets_location).await {
        fatal(format!("migration failed: {e}"));
    }

    seed_default_settings(&pool, &storage_dir).await;

    let cleanup = CleanupQueue::start();

    Bootstrapped { pool, cleanup }
}

async fn seed_default_settings(pool: &SqlitePool, storage_dir: &std::path::Path) {
    let row: Option<i64> = match sqlx::query_scalar("SELECT id FROM settings WHERE id = 1")
        .fetch_optional(pool)
        .await
    {
        Ok(row) => row,
        Err(e) => fatal(format!("failed to read settings row at startup: {e}")),
    };

    if row.is_some() {
        return;
    }

    let result = sqlx::query("INSERT INTO settings (id, storage_dir) VALUES (1, ?1)")
        .bind(storage_dir.display().to_string())
        .execute(pool)
        .await;

    if let Err(e) = result {
        fatal(format!("failed to seed default settings row: {e}"));
    }
}
