//! Persisted data model — §3 of the spec.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Youtube,
    Unknown,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Youtube => "youtube",
            Source::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "youtube" => Some(Source::Youtube),
            "unknown" => Some(Source::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Downloading,
    Finished,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Downloading => "downloading",
            Status::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "downloading" => Some(Status::Downloading),
            "finished" => Some(Status::Finished),
            _ => None,
        }
    }
}

/// A row of the `files` table.
///
/// Invariants (enforced by [`crate::workflow::downloading`], not by this
/// type): `source_url` unique; `status == Finished` implies `path.is_some()`;
/// no row may sit in `Downloading` with no live workflow behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub path: Option<String>,
    pub source_url: String,
    pub source: Source,
    pub status: Status,
    #[serde(rename = "addedAt")]
    pub added_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Single-row settings table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub storage_dir: String,
}
