//! Session — C6. One bidirectional WebSocket connection, a read pump and a
//! write pump, and the `{uuid -> Job}` registry they share. Stays in
//! `rdm_server` (not `rdm_core`) because it is the one component that must
//! know about `axum`'s `WebSocket` type; the Job Builder (C7) itself is
//! transport-agnostic and lives in `rdm_core::job::builder`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};

use rdm_core::job::builder;
use rdm_core::job::deps::Deps;
use rdm_core::job::{Job, OutFrame};
use rdm_core::protocol::message::MessageType;
use rdm_core::protocol::{parse, serialize, Message};

const OUTBOUND_QUEUE_CAPACITY: usize = 5;
const JOB_INBOUND_CAPACITY: usize = 8;
const WRITE_DEADLINE: Duration = Duration::from_secs(5);

type JobsMap = Arc<Mutex<HashMap<String, mpsc::Sender<Message>>>>;

/// Drive one client connection to completion. Runs the read and write pumps
/// concurrently and returns once both have exited (connection closed).
/// Returns whether the caller should also shut the server down, i.e.
/// `!allow_client_reconnect`.
pub async fn run(ws: WebSocket, deps: Deps, allow_client_reconnect: bool) -> bool {
    let (ws_tx, ws_rx) = ws.split();
    let jobs: JobsMap = Arc::new(Mutex::new(HashMap::new()));
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

    let writer = tokio::spawn(write_pump(outbound_rx, ws_tx, jobs.clone()));
    read_pump(ws_rx, jobs, outbound_tx, deps).await;

    let _ = writer.await;
    !allow_client_reconnect
}

async fn read_pump(
    mut ws_rx: SplitStream<WebSocket>,
    jobs: JobsMap,
    outbound: mpsc::Sender<OutFrame>,
    deps: Deps,
) {
    while let Some(received) = ws_rx.next().await {
        let frame = match received {
            Ok(frame) => frame,
            Err(e) => {
                log::info!("websocket read ended: {e}");
                break;
            }
        };

        let bytes = match frame {
            WsMessage::Binary(b) => b,
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            WsMessage::Text(_) => {
                log::warn!("protocol violation: text frame on a binary-only transport, closing");
                break;
            }
        };

        let message = match parse(&bytes) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("malformed frame, closing connection: {e}");
                break;
            }
        };

        route(message, &jobs, &outbound, &deps).await;
    }
}

async fn route(message: Message, jobs: &JobsMap, outbound: &mpsc::Sender<OutFrame>, deps: &Deps) {
    let uuid = message.header.uuid.clone();

    let existing = jobs.lock().await.get(&uuid).cloned();
    if let Some(job_sender) = existing {
        // Non-blocking: a slow job must never stall routing to other jobs.
        if job_sender.try_send(message).is_err() {
            log::warn!("job {uuid}: inbound channel full or closed, dropping message");
        }
        return;
    }

    if message.header.r#type == MessageType::CancelRequest {
        log::debug!("cancel request for unknown job {uuid}, dropping");
        return;
    }

    match builder::build(&message) {
        Some(adapter) => {
            let (job_tx, job_rx) = mpsc::channel(JOB_INBOUND_CAPACITY);
            jobs.lock().await.insert(uuid.clone(), job_tx);
            let job = Job::new(uuid, job_rx, outbound.clone());
            tokio::spawn(job.run(deps.clone(), adapter, message));
        }
        None => {
            log::warn!("message type {:?} cannot start a job, dropping", message.header.r#type);
        }
    }
}

async fn write_pump(mut rx: mpsc::Receiver<OutFrame>, mut ws_tx: SplitSink<WebSocket, WsMessage>, jobs: JobsMap) {
    while let Some(frame) = rx.recv().await {
        if frame.done {
            jobs.lock().await.remove(&frame.message.header.uuid);
        }

        let bytes = serialize(&frame.message);
        let send = ws_tx.send(WsMessage::Binary(bytes.into()));

        match tokio::time::timeout(WRITE_DEADLINE, send).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("websocket write failed: {e}");
                break;
            }
            Err(_) => {
                log::warn!("websocket write deadline exceeded, closing connection");
                break;
            }
        }
    }

    let _ = ws_tx.close().await;
}
