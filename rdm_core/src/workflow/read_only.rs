//! The five read-only workflows — §4.7. Each runs synchronously against the
//! store and reports either a [`WfResult`] or a domain [`WfEvent::Error`].
//! They share the downloading workflow's context-done handling but have no
//! subprocess and nothing to roll back.

use std::future::Future;

use tokio::sync::mpsc;

use crate::job::context::{CancelReason, JobContext};
use crate::models::Settings;
use crate::protocol::payloads::{FileListItem, GetFilesResponse};
use crate::store::Store;
use crate::workflow::event::{WfEvent, WfResult};

async fn run_one_shot<F>(ctx: JobContext, out: mpsc::Sender<WfEvent>, op: F)
where
    F: Future<Output = Result<WfResult, String>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            let event = match ctx.reason() {
                CancelReason::Timeout => WfEvent::Error("Timeout exceeded".into()),
                CancelReason::Explicit => WfEvent::Canceled,
            };
            let _ = out.send(event).await;
        }
        result = op => {
            let event = match result {
                Ok(r) => WfEvent::Result(r),
                Err(reason) => WfEvent::Error(reason),
            };
            let _ = out.send(event).await;
        }
    }
}

pub async fn get_files(
    store: std::sync::Arc<dyn Store>,
    ctx: JobContext,
    out: mpsc::Sender<WfEvent>,
    limit: i64,
    offset: i64,
) {
    run_one_shot(ctx, out, async move {
        let (files, total) = store
            .get_files(limit, offset)
            .await
            .map_err(|e| format!("database error: {e}"))?;
        let files = files.iter().map(FileListItem::from).collect();
        Ok(WfResult::Files(GetFilesResponse { files, total }))
    })
    .await;
}

pub async fn get_file(store: std::sync::Arc<dyn Store>, ctx: JobContext, out: mpsc::Sender<WfEvent>, id: i64) {
    run_one_shot(ctx, out, async move {
        match store.get_file(id).await {
            Ok(Some(record)) => Ok(WfResult::File(record)),
            Ok(None) => Err("file not found".into()),
            Err(e) => Err(format!("database error: {e}")),
        }
    })
    .await;
}

pub async fn delete_files(store: std::sync::Arc<dyn Store>, ctx: JobContext, out: mpsc::Sender<WfEvent>, ids: Vec<i64>) {
    run_one_shot(ctx, out, async move {
        store
            .delete_files(&ids)
            .await
            .map(|()| WfResult::Deleted)
            .map_err(|e| format!("database error: {e}"))
    })
    .await;
}

pub async fn get_settings(store: std::sync::Arc<dyn Store>, ctx: JobContext, out: mpsc::Sender<WfEvent>) {
    run_one_shot(ctx, out, async move {
        store
            .get_settings()
            .await
            .map(|s| WfResult::Settings { storage_dir: s.storage_dir })
            .map_err(|e| format!("database error: {e}"))
    })
    .await;
}

pub async fn update_settings(
    store: std::sync::Arc<dyn Store>,
    ctx: JobContext,
    out: mpsc::Sender<WfEvent>,
    storage_dir: String,
) {
    run_one_shot(ctx, out, async move {
        let settings = Settings { storage_dir: storage_dir.clone() };
        store
            .update_settings(&settings)
            .await
            .map(|()| WfResult::Settings { storage_dir })
            .map_err(|e| format!("database error: {e}"))
    })
    .await;
}
