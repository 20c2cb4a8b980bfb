//! Dependencies shared by every workflow a Job might spawn.
//!
//! Bundled once by the server at bootstrap and cloned (cheaply — everything
//! here is an `Arc` or a small value) into each Job.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cleanup::CleanupQueue;
use crate::store::Store;

#[derive(Clone)]
pub struct Deps {
    pub store: Arc<dyn Store>,
    pub cleanup: CleanupQueue,
    pub downloader_path: PathBuf,
    pub ffmpeg_location: PathBuf,
    /// Parent directory under which `tmp/<uuid>/` is created for one download.
    pub tmp_root: PathBuf,
}
