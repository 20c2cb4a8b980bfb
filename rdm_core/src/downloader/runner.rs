//! Downloader Runner — C2. Spawns the external downloader tool, stream-parses
//! its line-delimited JSON progress protocol, and emits a small event set.
//!
//! Mirrors the original `data/downloader.go`, restructured around Tokio
//! tasks instead of a blocking goroutine: a dedicated reader task owns the
//! child's stdout so cancellation can abort it independently of whatever
//! the main runner task is doing.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cleanup::CleanupQueue;

#[derive(Debug, Clone)]
pub enum RunnerEvent {
    Progress { percentage: f64 },
    Done { filename: String },
    Error { reason: String },
}

/// Raw shape of a line the downloader tool writes to stdout.
#[derive(serde::Deserialize)]
struct ToolMessage {
    #[serde(rename = "type")]
    r#type: i32,
    percentage: Option<f64>,
    filename: Option<String>,
    #[allow(dead_code)]
    msg: Option<String>,
}

const TOOL_PROGRESS: i32 = 1;
const TOOL_DONE: i32 = 2;
const TOOL_FAILED: i32 = 3;

/// A live invocation. Events arrive on `events`; `join` must be awaited
/// before the caller can assume the temp dir has been posted for cleanup
/// and the child process has been reaped.
pub struct RunnerHandle {
    pub events: mpsc::Receiver<RunnerEvent>,
    join: tokio::task::JoinHandle<()>,
}

impl RunnerHandle {
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Spawn the downloader tool against `url`, writing into `temp_dir` and
/// copying the finished artifact into `storage_dir` on success.
pub fn spawn(
    downloader_path: PathBuf,
    ffmpeg_location: PathBuf,
    url: String,
    temp_dir: PathBuf,
    storage_dir: PathBuf,
    cancel: CancellationToken,
    cleanup: CleanupQueue,
) -> RunnerHandle {
    let (tx, rx) = mpsc::channel(32);
    let join = tokio::spawn(run(
        downloader_path,
        ffmpeg_location,
        url,
        temp_dir,
        storage_dir,
        cancel,
        cleanup,
        tx,
    ));
    RunnerHandle { events: rx, join }
}

enum Outcome {
    Done(String),
    Failed,
    Canceled,
}

async fn run(
    downloader_path: PathBuf,
    ffmpeg_location: PathBuf,
    url: String,
    temp_dir: PathBuf,
    storage_dir: PathBuf,
    cancel: CancellationToken,
    cleanup: CleanupQueue,
    tx: mpsc::Sender<RunnerEvent>,
) {
    if let Err(e) = tokio::fs::create_dir_all(&temp_dir).await {
        log::error!("failed to create temp dir {}: {e}", temp_dir.display());
        let _ = tx.send(RunnerEvent::Error { reason: "downloading failed".into() }).await;
        cleanup.enqueue(temp_dir).await;
        return;
    }

    let mut child = match Command::new(&downloader_path)
        .arg("--url")
        .arg(&url)
        .arg("--dir")
        .arg(&temp_dir)
        .arg("--ffmpeg_location")
        .arg(&ffmpeg_location)
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::error!("failed to spawn downloader tool: {e}");
            let _ = tx.send(RunnerEvent::Error { reason: "downloading failed".into() }).await;
            cleanup.enqueue(temp_dir).await;
            return;
        }
    };

    let stdout = child.stdout.take().expect("stdout was piped");
    let (line_tx, mut line_rx) = mpsc::channel::<std::io::Result<Option<String>>>(1);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            let line = lines.next_line().await;
            let is_terminal = !matches!(line, Ok(Some(_)));
            if line_tx.send(line).await.is_err() || is_terminal {
                return;
            }
        }
    });

    let outcome = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                reader.abort();
                let _ = child.start_kill();
                let _ = reader.await;
                break Outcome::Canceled;
            }
            line = line_rx.recv() => {
                match line {
                    Some(Ok(Some(text))) => match handle_line(&text, &tx).await {
                        LineOutcome::Continue => continue,
                        LineOutcome::Done(filename) => break Outcome::Done(filename),
                        LineOutcome::Failed => break Outcome::Failed,
                    },
                    // EOF before a terminal message, or a read error — both
                    // are reader failures on a pipe we never asked to close.
                    Some(Ok(None)) | Some(Err(_)) | None => break Outcome::Failed,
                }
            }
        }
    };

    reader.abort();
    let _ = child.wait().await;

    match outcome {
        Outcome::Canceled => {}
        Outcome::Failed => {
            let _ = tx.send(RunnerEvent::Error { reason: "downloading failed".into() }).await;
        }
        Outcome::Done(filename) => {
            match place_artifact(&temp_dir, &storage_dir, &filename).await {
                Ok(()) => {
                    let _ = tx.send(RunnerEvent::Done { filename }).await;
                }
                Err(e) => {
                    log::error!("failed to place downloaded artifact: {e}");
                    let _ = tx.send(RunnerEvent::Error { reason: "downloading failed".into() }).await;
                }
            }
        }
    }

    cleanup.enqueue(temp_dir).await;
}

enum LineOutcome {
    Continue,
    Done(String),
    Failed,
}

async fn handle_line(text: &str, tx: &mpsc::Sender<RunnerEvent>) -> LineOutcome {
    let parsed: ToolMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("unparsable downloader line {text:?}: {e}");
            return LineOutcome::Failed;
        }
    };

    match parsed.r#type {
        TOOL_PROGRESS => match parsed.percentage {
            Some(percentage) => {
                let _ = tx.send(RunnerEvent::Progress { percentage }).await;
                LineOutcome::Continue
            }
            None => {
                log::warn!("progress message missing percentage field");
                LineOutcome::Failed
            }
        },
        TOOL_DONE => match parsed.filename {
            Some(filename) => LineOutcome::Done(filename),
            None => {
                log::warn!("done message missing filename field");
                LineOutcome::Failed
            }
        },
        TOOL_FAILED => LineOutcome::Failed,
        other => {
            log::warn!("unrecognized downloader message type {other}");
            LineOutcome::Failed
        }
    }
}

/// Copy `filename` from `temp_dir` to `storage_dir`, preserving the basename.
async fn place_artifact(temp_dir: &Path, storage_dir: &Path, filename: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(storage_dir).await?;
    let src = temp_dir.join(filename);
    let dst = storage_dir.join(filename);
    tokio::fs::copy(&src, &dst).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn place_artifact_copies_basename() {
        let temp = tempfile::tempdir().unwrap();
        let storage = tempfile::tempdir().unwrap();
        tokio::fs::write(temp.path().join("clip.mp4"), b"data").await.unwrap();

        place_artifact(temp.path(), storage.path(), "clip.mp4").await.unwrap();

        assert_eq!(
            tokio::fs::read(storage.path().join("clip.mp4")).await.unwrap(),
            b"data"
        );
    }
}
