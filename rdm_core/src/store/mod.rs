pub mod migrate;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{FileRecord, Settings, Source, Status};

/// Persistence surface consumed by the core — §6 "Store operations".
///
/// Kept as a trait so workflows (in particular the downloading workflow,
/// which must roll back a reservation on every non-success path) can be
/// exercised against an in-memory fake without a real database.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_file_by_url(&self, url: &str) -> Result<Option<FileRecord>, StoreError>;
    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, StoreError>;
    async fn get_files(&self, limit: i64, offset: i64) -> Result<(Vec<FileRecord>, i64), StoreError>;

    /// Reserve a new row. Returns the assigned id.
    async fn insert_file(&self, source_url: &str, source: Source) -> Result<i64, StoreError>;
    async fn update_file_status(&self, id: i64, status: Status) -> Result<(), StoreError>;
    async fn update_file_path(&self, id: i64, path: &str) -> Result<(), StoreError>;
    async fn delete_file(&self, id: i64) -> Result<(), StoreError>;
    async fn delete_files(&self, ids: &[i64]) -> Result<(), StoreError>;

    async fn get_settings(&self) -> Result<Settings, StoreError>;
    /// Delete-then-insert in one transaction, per spec.
    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError>;
}
