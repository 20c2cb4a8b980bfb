//! Events a workflow emits to its owning Job — §4.4/§4.5.
//!
//! `Error`, `Done`, and `Canceled` are handled by the Job itself; everything
//! else (`Progress`, `Result`) is domain-specific and goes through the
//! adapter's `handle_wf_event` translation.

use crate::models::FileRecord;
use crate::protocol::payloads::GetFilesResponse;

#[derive(Debug, Clone)]
pub enum WfEvent {
    /// A reportable failure. Job emits `Error{reason}` and terminates.
    Error(String),
    /// Generic terminal success with no payload (used by the downloading
    /// workflow's final frame). Job emits `Done` and terminates.
    Done,
    /// Emitted only from the context-done path of a workflow's run loop, in
    /// lieu of `Error`, when cancellation was explicit rather than a timeout.
    Canceled,
    /// Downloading-workflow-specific: forwarded as `DownloadingProgress`.
    /// `id` is the reserved file row, carried on every tick per REDESIGN FLAGS.
    Progress { id: i64, percentage: f64 },
    /// Read-only-workflow-specific: the one-shot result to translate into
    /// the matching Response frame.
    Result(WfResult),
}

#[derive(Debug, Clone)]
pub enum WfResult {
    Files(GetFilesResponse),
    File(FileRecord),
    Settings { storage_dir: String },
    Deleted,
}
