//! Typed payload bodies for each [`super::MessageType`]. The codec never
//! looks inside these — they are decoded by whichever workflow adapter
//! recognizes the header's `type`.

use serde::{Deserialize, Serialize};

use crate::models::{FileRecord, Source, Status};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadingRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadingProgress {
    pub id: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetFilesRequest {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileListItem {
    pub id: i64,
    pub source: Source,
    pub status: Status,
    #[serde(rename = "addedAt")]
    pub added_at: String,
}

impl From<&FileRecord> for FileListItem {
    fn from(f: &FileRecord) -> Self {
        Self {
            id: f.id,
            source: f.source,
            status: f.status,
            added_at: f.added_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetFilesResponse {
    pub files: Vec<FileListItem>,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetFileRequest {
    pub id: i64,
}

pub type GetFileResponse = FileRecord;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteFilesRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetSettingsResponse {
    #[serde(rename = "storageDir")]
    pub storage_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    #[serde(rename = "storageDir")]
    pub storage_dir: String,
}

pub type UpdateSettingsResponse = GetSettingsResponse;
