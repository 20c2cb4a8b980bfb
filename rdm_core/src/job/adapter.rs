//! Workflow Adapter — C4. A tagged enum rather than a trait object, per the
//! design note in spec §9: the Job stays workflow-agnostic by matching on
//! this instead of calling through a vtable.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::WorkflowError;
use crate::job::context::JobContext;
use crate::job::deps::Deps;
use crate::job::JobState;
use crate::protocol::message::{Message, MessageType};
use crate::protocol::payloads::{
    DeleteFilesRequest, DownloadingProgress, DownloadingRequest, GetFileRequest, GetFilesRequest,
    GetSettingsResponse, UpdateSettingsRequest, UpdateSettingsResponse,
};
use crate::workflow::{downloading, read_only, WfEvent, WfResult};

pub enum WorkflowAdapter {
    Downloading,
    GetFiles,
    GetFile,
    DeleteFiles,
    GetSettings,
    UpdateSettings,
}

impl WorkflowAdapter {
    /// Map a starting message's type to the adapter that handles it — C7's
    /// whole job, kept here since it's a pure function of `MessageType`.
    pub fn for_message_type(t: MessageType) -> Option<Self> {
        use MessageType::*;
        Some(match t {
            DownloadingRequest => WorkflowAdapter::Downloading,
            GetFilesRequest => WorkflowAdapter::GetFiles,
            GetFileRequest => WorkflowAdapter::GetFile,
            DeleteFilesRequest => WorkflowAdapter::DeleteFiles,
            GetSettingsRequest => WorkflowAdapter::GetSettings,
            UpdateSettingsRequest => WorkflowAdapter::UpdateSettings,
            _ => return None,
        })
    }

    /// CreateWf + RunWf collapsed into one step: validate `start`'s payload
    /// against this workflow's request schema, then spawn it. Returns the
    /// event channel the Job selects on and the workflow's join handle.
    pub fn run(
        &self,
        deps: Deps,
        ctx: JobContext,
        start: &Message,
    ) -> Result<(mpsc::Receiver<WfEvent>, JoinHandle<()>), WorkflowError> {
        let (tx, rx) = mpsc::channel(8);
        let join = match self {
            WorkflowAdapter::Downloading => {
                let req: DownloadingRequest = start
                    .payload_as()
                    .map_err(|e| WorkflowError::Validation(format!("invalid DownloadingRequest: {e}")))?;
                if req.url.trim().is_empty() {
                    return Err(WorkflowError::Validation("url must not be empty".into()));
                }
                tokio::spawn(downloading::run(req.url, deps, ctx, tx))
            }
            WorkflowAdapter::GetFiles => {
                let req: GetFilesRequest = start
                    .payload_as()
                    .map_err(|e| WorkflowError::Validation(format!("invalid GetFilesRequest: {e}")))?;
                if req.limit < 0 || req.offset < 0 {
                    return Err(WorkflowError::Validation("limit and offset must be non-negative".into()));
                }
                tokio::spawn(read_only::get_files(deps.store, ctx, tx, req.limit, req.offset))
            }
            WorkflowAdapter::GetFile => {
                let req: GetFileRequest = start
                    .payload_as()
                    .map_err(|e| WorkflowError::Validation(format!("invalid GetFileRequest: {e}")))?;
                tokio::spawn(read_only::get_file(deps.store, ctx, tx, req.id))
            }
            WorkflowAdapter::DeleteFiles => {
                let req: DeleteFilesRequest = start
                    .payload_as()
                    .map_err(|e| WorkflowError::Validation(format!("invalid DeleteFilesRequest: {e}")))?;
                if req.ids.is_empty() {
                    return Err(WorkflowError::Validation("ids must not be empty".into()));
                }
                tokio::spawn(read_only::delete_files(deps.store, ctx, tx, req.ids))
            }
            WorkflowAdapter::GetSettings => tokio::spawn(read_only::get_settings(deps.store, ctx, tx)),
            WorkflowAdapter::UpdateSettings => {
                let req: UpdateSettingsRequest = start
                    .payload_as()
                    .map_err(|e| WorkflowError::Validation(format!("invalid UpdateSettingsRequest: {e}")))?;
                if req.storage_dir.trim().is_empty() {
                    return Err(WorkflowError::Validation("storageDir must not be empty".into()));
                }
                tokio::spawn(read_only::update_settings(deps.store, ctx, tx, req.storage_dir))
            }
        };
        Ok((rx, join))
    }

    /// Every workflow rejects mid-flight session messages today — there is
    /// no adapter that accepts a non-cancel frame once it has started.
    pub fn handle_session_message(&self, msg: &Message) -> Result<(), WorkflowError> {
        Err(WorkflowError::Validation(format!(
            "unexpected message type {:?} for a running job",
            msg.header.r#type
        )))
    }

    /// Translate a domain workflow event (`Progress`/`Result`) into an
    /// outbound frame and the Job's next state. `Error`/`Done`/`Canceled`
    /// never reach here — the Job intercepts those itself.
    pub fn handle_wf_event(&self, uuid: &str, event: WfEvent) -> (Message, JobState) {
        match event {
            WfEvent::Progress { id, percentage } => {
                let msg = Message::with_json(MessageType::DownloadingProgress, uuid, &DownloadingProgress { id, percentage })
                    .expect("DownloadingProgress always serializes");
                (msg, JobState::Active)
            }
            WfEvent::Result(WfResult::Files(resp)) => {
                let msg = Message::with_json(MessageType::GetFilesResponse, uuid, &resp)
                    .expect("GetFilesResponse always serializes");
                (msg, JobState::Done)
            }
            WfEvent::Result(WfResult::File(record)) => {
                let msg = Message::with_json(MessageType::GetFileResponse, uuid, &record)
                    .expect("GetFileResponse always serializes");
                (msg, JobState::Done)
            }
            WfEvent::Result(WfResult::Settings { storage_dir }) => {
                let built = match self {
                    WorkflowAdapter::UpdateSettings => {
                        Message::with_json(MessageType::UpdateSettingsResponse, uuid, &UpdateSettingsResponse { storage_dir })
                    }
                    _ => Message::with_json(MessageType::GetSettingsResponse, uuid, &GetSettingsResponse { storage_dir }),
                };
                (built.expect("settings response always serializes"), JobState::Done)
            }
            WfEvent::Result(WfResult::Deleted) => {
                // No dedicated response type for DeleteFiles on the wire;
                // the generic terminal frame covers it.
                (Message::new(MessageType::Done, uuid, Vec::new()), JobState::Done)
            }
            WfEvent::Error(_) | WfEvent::Done | WfEvent::Canceled => {
                unreachable!("Error/Done/Canceled are intercepted by the Job before reaching the adapter")
            }
        }
    }
}
