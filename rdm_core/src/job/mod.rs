//! Job — C5. Per-request state machine merging three event sources: the
//! job's own cancellation context, the session's inbound channel for this
//! uuid, and the workflow's outbound event channel. See spec §4.5.

pub mod adapter;
pub mod builder;
pub mod context;
pub mod deps;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::protocol::message::{Message, MessageType};
use crate::protocol::payloads::ErrorPayload;
use crate::workflow::WfEvent;
use adapter::WorkflowAdapter;
use context::{CancelReason, JobContext};
use deps::Deps;

/// Every job has the same absolute deadline from `Run` entry — spec §4.5.
pub const JOB_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Active,
    Canceled,
    Done,
    /// Terminal. Named after the spec's state table, not `Option::None`.
    None,
}

/// One frame destined for the session's write pump, plus whether it is the
/// job's terminal frame (the write pump uses this to unregister the job —
/// the flag never appears on the wire itself).
pub struct OutFrame {
    pub message: Message,
    pub done: bool,
}

/// A per-uuid job. Owned and driven to completion by the Session, which
/// feeds it inbound frames and reads its outbound queue.
pub struct Job {
    pub uuid: String,
    session_in: mpsc::Receiver<Message>,
    outbound: mpsc::Sender<OutFrame>,
}

impl Job {
    pub fn new(uuid: String, session_in: mpsc::Receiver<Message>, outbound: mpsc::Sender<OutFrame>) -> Self {
        Self { uuid, session_in, outbound }
    }

    async fn emit(&self, message: Message, done: bool) {
        if self.outbound.send(OutFrame { message, done }).await.is_err() {
            log::warn!("job {}: session outbound closed, dropping frame", self.uuid);
        }
    }

    async fn emit_error(&self, reason: impl Into<String>, done: bool) {
        let payload = ErrorPayload { reason: reason.into() };
        match Message::with_json(MessageType::Error, &self.uuid, &payload) {
            Ok(msg) => self.emit(msg, done).await,
            Err(e) => log::error!("job {}: failed to serialize error payload: {e}", self.uuid),
        }
    }

    /// Drive this job to completion. `start` is the message that created it.
    pub async fn run(mut self, deps: Deps, adapter: WorkflowAdapter, start: Message) {
        let ctx = JobContext::new(JOB_DEADLINE);

        let (mut wf_rx, join) = match adapter.run(deps, ctx.clone(), &start) {
            Ok(pair) => pair,
            Err(e) => {
                self.emit_error(e.reason(), true).await;
                return;
            }
        };

        loop {
            tokio::select! {
                biased;

                _ = ctx.cancelled() => {
                    let _ = join.await;
                    match wf_rx.try_recv() {
                        Ok(WfEvent::Error(reason)) => self.emit_error(reason, true).await,
                        Ok(WfEvent::Canceled) => {
                            let msg = Message::new(MessageType::Canceled, &self.uuid, Vec::new());
                            self.emit(msg, true).await;
                        }
                        _ => {
                            let reason = match ctx.reason() {
                                CancelReason::Timeout => "Timeout exceeded",
                                CancelReason::Explicit => "cancelled",
                            };
                            self.emit_error(reason, true).await;
                        }
                    }
                    return;
                }

                session_msg = self.session_in.recv() => {
                    match session_msg {
                        Some(m) if m.header.r#type == MessageType::CancelRequest => {
                            ctx.cancel();
                        }
                        Some(m) => {
                            if let Err(e) = adapter.handle_session_message(&m) {
                                self.emit_error(e.reason(), false).await;
                            }
                        }
                        None => {
                            // Session is tearing down; treat like an explicit
                            // cancel and let the ctx.cancelled() arm finish up.
                            ctx.cancel();
                        }
                    }
                }

                wf_event = wf_rx.recv() => {
                    match wf_event {
                        Some(WfEvent::Error(reason)) => {
                            let _ = join.await;
                            self.emit_error(reason, true).await;
                            return;
                        }
                        Some(WfEvent::Done) => {
                            let _ = join.await;
                            let msg = Message::new(MessageType::Done, &self.uuid, Vec::new());
                            self.emit(msg, true).await;
                            return;
                        }
                        Some(WfEvent::Canceled) => {
                            let _ = join.await;
                            let msg = Message::new(MessageType::Canceled, &self.uuid, Vec::new());
                            self.emit(msg, true).await;
                            return;
                        }
                        Some(other) => {
                            let (message, next) = adapter.handle_wf_event(&self.uuid, other);
                            match next {
                                JobState::Active => self.emit(message, false).await,
                                JobState::Done => {
                                    let _ = join.await;
                                    self.emit(message, true).await;
                                    return;
                                }
                                JobState::Canceled | JobState::None => {
                                    unreachable!("adapter.handle_wf_event never returns Canceled/None")
                                }
                            }
                        }
                        None => {
                            // Workflow task ended without a terminal event —
                            // only possible if it panicked.
                            let _ = join.await;
                            self.emit_error("internal error", true).await;
                            return;
                        }
                    }
                }
            }
        }
    }
}
