//! Downloading Workflow — C3, "the hardest component". Drives one download
//! end-to-end: classify, normalize, reserve, spawn the Runner, then merge
//! Runner events with the job's cancellation handle until a terminal event
//! is emitted.
//!
//! Grounded on `spec.md` §4.3; the Go source's `downloading_wf.go` snapshot
//! in `original_source/` is truncated, so this is built from the spec's
//! literal run-loop description rather than that file.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::downloader::runner::{self, RunnerEvent};
use crate::job::context::{CancelReason, JobContext};
use crate::job::deps::Deps;
use crate::models::Status;
use crate::source;
use crate::workflow::event::WfEvent;

/// Distance below which consecutive Progress events are suppressed.
const PROGRESS_THROTTLE: Duration = Duration::from_secs(1);

/// Preflight failures reported to the client before any Runner is spawned.
#[derive(Debug, Clone, Copy)]
pub enum PreflightError {
    UnrecognizedSource,
    AlreadyExists,
}

impl PreflightError {
    pub fn reason(&self) -> &'static str {
        match self {
            PreflightError::UnrecognizedSource => "unable to identify source",
            PreflightError::AlreadyExists => "file already exists",
        }
    }
}

/// Run preflight and, on success, the full run loop, forwarding every
/// [`WfEvent`] to `out`. Returns once a terminal event has been sent.
pub async fn run(url: String, deps: Deps, ctx: JobContext, out: mpsc::Sender<WfEvent>) {
    let (source, normalized) = match source::classify_and_normalize(&url) {
        Ok(pair) => pair,
        Err(_) => {
            let _ = out.send(WfEvent::Error(PreflightError::UnrecognizedSource.reason().into())).await;
            return;
        }
    };

    match deps.store.get_file_by_url(&normalized).await {
        Ok(Some(_)) => {
            let _ = out.send(WfEvent::Error(PreflightError::AlreadyExists.reason().into())).await;
            return;
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("preflight duplicate check failed: {e}");
            let _ = out.send(WfEvent::Error("downloading failed".into())).await;
            return;
        }
    }

    let id = match deps.store.insert_file(&normalized, source).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("reservation insert failed: {e}");
            let _ = out.send(WfEvent::Error("downloading failed".into())).await;
            return;
        }
    };

    let settings = match deps.store.get_settings().await {
        Ok(s) => s,
        Err(e) => {
            // We already reserved a row; roll it back before reporting.
            log::error!("failed to load settings after reservation: {e}");
            if let Err(e) = deps.store.delete_file(id).await {
                crate::error::fatal(format!("failed to roll back reservation {id} after settings load error: {e}"));
            }
            let _ = out.send(WfEvent::Error("downloading failed".into())).await;
            return;
        }
    };

    let temp_dir = deps.tmp_root.join(temp_dir_name(id));
    let handle = runner::spawn(
        deps.downloader_path.clone(),
        deps.ffmpeg_location.clone(),
        normalized,
        temp_dir,
        std::path::PathBuf::from(&settings.storage_dir),
        ctx.cancel_token(),
        deps.cleanup.clone(),
    );

    run_loop(id, deps, ctx, handle, out).await;
}

/// The temp directory is keyed by the reserved row id rather than the job's
/// uuid — stable, numeric, and never reused across jobs.
fn temp_dir_name(id: i64) -> String {
    format!("job-{id}")
}

async fn run_loop(
    id: i64,
    deps: Deps,
    ctx: JobContext,
    mut handle: runner::RunnerHandle,
    out: mpsc::Sender<WfEvent>,
) {
    // Unconditional initial tick, per spec — emitted before the select loop
    // and independent of the throttle window tracked below.
    let _ = out.send(WfEvent::Progress { id, percentage: 0.0 }).await;

    let mut last_forwarded: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                handle.join().await;
                if let Err(e) = deps.store.delete_file(id).await {
                    crate::error::fatal(format!("failed to delete reservation {id} on cancellation: {e}"));
                }
                let event = match ctx.reason() {
                    CancelReason::Timeout => WfEvent::Error("Timeout exceeded".into()),
                    CancelReason::Explicit => WfEvent::Canceled,
                };
                let _ = out.send(event).await;
                return;
            }
            event = handle.events.recv() => {
                match event {
                    Some(RunnerEvent::Progress { percentage }) => {
                        let now = Instant::now();
                        let should_forward = match last_forwarded {
                            None => true,
                            Some(prev) => now.duration_since(prev) > PROGRESS_THROTTLE,
                        };
                        if should_forward {
                            last_forwarded = Some(now);
                            let _ = out.send(WfEvent::Progress { id, percentage }).await;
                        }
                    }
                    Some(RunnerEvent::Done { filename }) => {
                        handle.join().await;
                        if let Err(e) = deps.store.update_file_path(id, &filename).await {
                            crate::error::fatal(format!("failed to persist path for file {id}: {e}"));
                        }
                        if let Err(e) = deps.store.update_file_status(id, Status::Finished).await {
                            crate::error::fatal(format!("failed to persist finished status for file {id}: {e}"));
                        }
                        let _ = out.send(WfEvent::Progress { id, percentage: 100.0 }).await;
                        let _ = out.send(WfEvent::Done).await;
                        return;
                    }
                    Some(RunnerEvent::Error { reason }) => {
                        handle.join().await;
                        if let Err(e) = deps.store.delete_file(id).await {
                            crate::error::fatal(format!("failed to delete reservation {id} after runner error: {e}"));
                        }
                        let _ = out.send(WfEvent::Error(reason)).await;
                        return;
                    }
                    None => {
                        // Runner dropped its sender without a terminal event —
                        // only possible if the task panicked. Treat like Error.
                        handle.join().await;
                        if let Err(e) = deps.store.delete_file(id).await {
                            crate::error::fatal(format!("failed to delete reservation {id} after runner channel closed: {e}"));
                        }
                        let _ = out.send(WfEvent::Error("downloading failed".into())).await;
                        return;
                    }
                }
            }
        }
    }
}
