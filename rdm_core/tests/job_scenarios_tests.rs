//! Scenario-based tests for the Job/Workflow/Adapter engine, mirroring the
//! numbered scenarios in spec.md §8. Exercises the read-only workflows and
//! the downloading workflow's preflight/cancellation paths directly against
//! a fake in-memory `Store` — no subprocess, no real database.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use rdm_core::cleanup::CleanupQueue;
use rdm_core::error::StoreError;
use rdm_core::job::adapter::WorkflowAdapter;
use rdm_core::job::builder;
use rdm_core::job::deps::Deps;
use rdm_core::job::Job;
use rdm_core::models::{FileRecord, Settings, Source, Status};
use rdm_core::protocol::message::MessageType;
use rdm_core::protocol::payloads::{
    DeleteFilesRequest, DownloadingRequest, GetFilesRequest, GetFilesResponse, GetSettingsResponse,
};
use rdm_core::protocol::Message;
use rdm_core::store::Store;

#[derive(Default)]
struct Inner {
    files: Vec<FileRecord>,
    settings: Option<Settings>,
    next_id: i64,
    /// If set, `get_settings` never resolves — used to simulate a hang so a
    /// cancellation/deadline can race it.
    hang_on_settings: bool,
}

#[derive(Clone, Default)]
struct FakeStore(Arc<Mutex<Inner>>);

impl FakeStore {
    fn with_settings(storage_dir: &str) -> Self {
        let store = Self::default();
        store.0.lock().unwrap().settings = Some(Settings { storage_dir: storage_dir.into() });
        store
    }

    fn hanging() -> Self {
        let store = Self::default();
        store.0.lock().unwrap().hang_on_settings = true;
        store
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn get_file_by_url(&self, url: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.0.lock().unwrap().files.iter().find(|f| f.source_url == url).cloned())
    }

    async fn get_file(&self, id: i64) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.0.lock().unwrap().files.iter().find(|f| f.id == id).cloned())
    }

    async fn get_files(&self, limit: i64, offset: i64) -> Result<(Vec<FileRecord>, i64), StoreError> {
        let inner = self.0.lock().unwrap();
        let total = inner.files.len() as i64;
        let files = inner
            .files
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((files, total))
    }

    async fn insert_file(&self, source_url: &str, source: Source) -> Result<i64, StoreError> {
        let mut inner = self.0.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.files.push(FileRecord {
            id,
            path: None,
            source_url: source_url.to_string(),
            source,
            status: Status::Downloading,
            added_at: "now".into(),
            updated_at: "now".into(),
        });
        Ok(id)
    }

    async fn update_file_status(&self, id: i64, status: Status) -> Result<(), StoreError> {
        let mut inner = self.0.lock().unwrap();
        if let Some(f) = inner.files.iter_mut().find(|f| f.id == id) {
            f.status = status;
        }
        Ok(())
    }

    async fn update_file_path(&self, id: i64, path: &str) -> Result<(), StoreError> {
        let mut inner = self.0.lock().unwrap();
        if let Some(f) = inner.files.iter_mut().find(|f| f.id == id) {
            f.path = Some(path.to_string());
        }
        Ok(())
    }

    async fn delete_file(&self, id: i64) -> Result<(), StoreError> {
        self.0.lock().unwrap().files.retain(|f| f.id != id);
        Ok(())
    }

    async fn delete_files(&self, ids: &[i64]) -> Result<(), StoreError> {
        self.0.lock().unwrap().files.retain(|f| !ids.contains(&f.id));
        Ok(())
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        if self.0.lock().unwrap().hang_on_settings {
            std::future::pending::<()>().await;
            unreachable!();
        }
        self.0.lock().unwrap().settings.clone().ok_or(StoreError::NoSettings)
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.0.lock().unwrap().settings = Some(settings.clone());
        Ok(())
    }
}

fn deps(store: FakeStore) -> Deps {
    Deps {
        store: Arc::new(store),
        cleanup: CleanupQueue::start(),
        downloader_path: PathBuf::from("/bin/true"),
        ffmpeg_location: PathBuf::from("/usr"),
        tmp_root: std::env::temp_dir(),
    }
}

async fn run_job(deps: Deps, start: Message) -> Vec<Message> {
    let (_session_tx, session_rx) = mpsc::channel(4);
    let (outbound_tx, mut outbound_rx) = mpsc::channel(16);
    let adapter = builder::build(&start).expect("message type starts a job");
    let job = Job::new(start.header.uuid.clone(), session_rx, outbound_tx);

    tokio::spawn(job.run(deps, adapter, start));

    let mut frames = Vec::new();
    while let Some(frame) = outbound_rx.recv().await {
        let done = frame.done;
        frames.push(frame.message);
        if done {
            break;
        }
    }
    frames
}

#[tokio::test]
async fn get_settings_round_trips() {
    let deps = deps(FakeStore::with_settings("/srv/media"));
    let start = Message::new(MessageType::GetSettingsRequest, "uuid-1", Vec::new());

    let frames = run_job(deps, start).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].header.r#type, MessageType::GetSettingsResponse);
    let resp: GetSettingsResponse = frames[0].payload_as().unwrap();
    assert_eq!(resp.storage_dir, "/srv/media");
}

#[tokio::test]
async fn get_files_returns_inserted_rows() {
    let store = FakeStore::with_settings("/srv/media");
    store.0.lock().unwrap().files.push(FileRecord {
        id: 1,
        path: Some("clip.mp4".into()),
        source_url: "https://www.youtube.com/watch?v=2AB3_l0iqSk".into(),
        source: Source::Youtube,
        status: Status::Finished,
        added_at: "now".into(),
        updated_at: "now".into(),
    });

    let start = Message::with_json(
        MessageType::GetFilesRequest,
        "uuid-2",
        &GetFilesRequest { limit: 10, offset: 0 },
    )
    .unwrap();

    let frames = run_job(deps(store), start).await;
    assert_eq!(frames[0].header.r#type, MessageType::GetFilesResponse);
    let resp: GetFilesResponse = frames[0].payload_as().unwrap();
    assert_eq!(resp.total, 1);
    assert_eq!(resp.files[0].id, 1);
}

#[tokio::test]
async fn delete_files_removes_rows_and_emits_generic_done() {
    let store = FakeStore::with_settings("/srv/media");
    store.0.lock().unwrap().files.push(FileRecord {
        id: 7,
        path: None,
        source_url: "https://www.youtube.com/watch?v=2AB3_l0iqSk".into(),
        source: Source::Youtube,
        status: Status::Pending,
        added_at: "now".into(),
        updated_at: "now".into(),
    });
    let inner = store.0.clone();

    let start =
        Message::with_json(MessageType::DeleteFilesRequest, "uuid-3", &DeleteFilesRequest { ids: vec![7] }).unwrap();

    let frames = run_job(deps(store), start).await;
    assert_eq!(frames[0].header.r#type, MessageType::Done);
    assert!(inner.lock().unwrap().files.is_empty());
}

#[tokio::test]
async fn unrecognized_source_is_rejected_before_any_row_is_created() {
    let store = FakeStore::with_settings("/srv/media");
    let inner = store.0.clone();

    let start = Message::with_json(
        MessageType::DownloadingRequest,
        "uuid-4",
        &DownloadingRequest { url: "https://example.com/video.mp4".into() },
    )
    .unwrap();

    let frames = run_job(deps(store), start).await;
    assert_eq!(frames[0].header.r#type, MessageType::Error);
    assert!(inner.lock().unwrap().files.is_empty());
}

#[tokio::test]
async fn duplicate_url_is_rejected_and_leaves_the_original_row_untouched() {
    let store = FakeStore::with_settings("/srv/media");
    store.0.lock().unwrap().files.push(FileRecord {
        id: 1,
        path: Some("clip.mp4".into()),
        source_url: "https://www.youtube.com/watch?v=2AB3_l0iqSk".into(),
        source: Source::Youtube,
        status: Status::Finished,
        added_at: "now".into(),
        updated_at: "now".into(),
    });
    let inner = store.0.clone();

    let start = Message::with_json(
        MessageType::DownloadingRequest,
        "uuid-5",
        &DownloadingRequest { url: "https://youtu.be/2AB3_l0iqSk".into() },
    )
    .unwrap();

    let frames = run_job(deps(store), start).await;
    assert_eq!(frames[0].header.r#type, MessageType::Error);
    assert_eq!(inner.lock().unwrap().files.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_expiry_emits_timeout_error_and_rolls_back_the_reservation() {
    let store = FakeStore::hanging();
    let inner = store.0.clone();

    let start = Message::with_json(
        MessageType::DownloadingRequest,
        "uuid-6",
        &DownloadingRequest { url: "https://youtu.be/2AB3_l0iqSk".into() },
    )
    .unwrap();

    let job_handle = tokio::spawn(run_job(deps(store), start));

    // Let the job actually start and register its 60s deadline timer before
    // advancing the clock past it.
    tokio::task::yield_now().await;

    // The reservation is inserted before the hang on `get_settings`, so it
    // is visible immediately; advancing past the 60s job deadline should
    // both roll it back and terminate the job with a timeout error.
    tokio::time::advance(Duration::from_secs(61)).await;

    let frames = job_handle.await.unwrap();
    assert_eq!(frames[0].header.r#type, MessageType::Error);
    assert!(inner.lock().unwrap().files.is_empty());
}
