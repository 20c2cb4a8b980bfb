use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::StoreError;
use crate::models::{FileRecord, Settings, Source, Status};

use super::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> Result<FileRecord, StoreError> {
    let source_str: String = row.try_get("source")?;
    let status_str: String = row.try_get("status")?;
    Ok(FileRecord {
        id: row.try_get("id")?,
        path: row.try_get("path")?,
        source_url: row.try_get("source_url")?,
        source: Source::parse(&source_str).unwrap_or(Source::Unknown),
        status: Status::parse(&status_str).unwrap_or(Status::Pending),
        added_at: row.try_get("added_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_file_by_url(&self, url: &str) -> Result<Option<FileRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, path, source_url, source, status, added_at, updated_at
             FROM files WHERE source_url = ?1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_file).transpose()
    }

    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, path, source_url, source, status, added_at, updated_at
             FROM files WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_file).transpose()
    }

    async fn get_files(&self, limit: i64, offset: i64) -> Result<(Vec<FileRecord>, i64), StoreError> {
        let rows = sqlx::query(
            "SELECT id, path, source_url, source, status, added_at, updated_at
             FROM files ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let files = rows.iter().map(row_to_file).collect::<Result<Vec<_>, _>>()?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await?;

        Ok((files, total))
    }

    async fn insert_file(&self, source_url: &str, source: Source) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "INSERT INTO files (path, source_url, source, status, added_at, updated_at)
             VALUES (NULL, ?1, ?2, ?3, datetime('now'), datetime('now'))
             RETURNING id",
        )
        .bind(source_url)
        .bind(source.as_str())
        .bind(Status::Downloading.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn update_file_status(&self, id: i64, status: Status) -> Result<(), StoreError> {
        sqlx::query("UPDATE files SET status = ?2, updated_at = datetime('now') WHERE id = ?1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_file_path(&self, id: i64, path: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE files SET path = ?2, updated_at = datetime('now') WHERE id = ?1")
            .bind(id)
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_file(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM files WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_files(&self, ids: &[i64]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM files WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        let row = sqlx::query("SELECT storage_dir FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Settings {
                storage_dir: row.try_get("storage_dir")?,
            }),
            None => Err(StoreError::NoSettings),
        }
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM settings WHERE id = 1")
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO settings (id, storage_dir) VALUES (1, ?1)")
            .bind(&settings.storage_dir)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
