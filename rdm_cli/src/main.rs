//! Packet CLI — C14. A terminal client for exercising the server by hand:
//! connect, send one `DownloadingRequest`, render its progress stream, and
//! forward Ctrl-C as a `CancelRequest` for the same uuid.
//!
//! Grounded on the original's `cmd/build-packet` utility, restyled around
//! the teacher's `indicatif`-based `TerminalProgressObserver`.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

use rdm_core::protocol::message::MessageType;
use rdm_core::protocol::payloads::{DownloadingProgress, DownloadingRequest, ErrorPayload};
use rdm_core::protocol::{parse, serialize, Message};

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "rdm", about = "Packet client for the rdm download server")]
struct Args {
    /// URL to download.
    url: String,

    /// WebSocket address of the server.
    #[arg(long, default_value = "ws://127.0.0.1:8597/ws")]
    server: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let (ws_stream, _response) = match tokio_tungstenite::connect_async(&args.server).await {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("failed to connect to {}: {e}", args.server);
            std::process::exit(1);
        }
    };
    let (mut sink, mut stream) = ws_stream.split();

    let uuid = uuid::Uuid::new_v4().to_string();
    let request = DownloadingRequest { url: args.url.clone() };
    let start = Message::with_json(MessageType::DownloadingRequest, &uuid, &request)
        .expect("DownloadingRequest always serializes");

    if let Err(e) = sink.send(WsMessage::Binary(serialize(&start).into())).await {
        eprintln!("failed to send request: {e}");
        std::process::exit(1);
    }

    println!("requested download of {} (uuid={uuid})", args.url);
    let observer = TerminalProgressObserver::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                let cancel = Message::new(MessageType::CancelRequest, uuid.clone(), Vec::new());
                let _ = sink.send(WsMessage::Binary(serialize(&cancel).into())).await;
            }
            received = stream.next() => {
                let Some(received) = received else {
                    eprintln!("connection closed before a terminal frame arrived");
                    break;
                };
                let frame = match received {
                    Ok(WsMessage::Binary(bytes)) => bytes,
                    Ok(WsMessage::Close(_)) => {
                        eprintln!("server closed the connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        eprintln!("websocket error: {e}");
                        break;
                    }
                };

                let message = match parse(&frame) {
                    Ok(m) => m,
                    Err(e) => {
                        eprintln!("malformed frame from server: {e}");
                        break;
                    }
                };

                if message.header.uuid != uuid {
                    continue;
                }

                match message.header.r#type {
                    MessageType::DownloadingProgress => {
                        if let Ok(progress) = message.payload_as::<DownloadingProgress>() {
                            observer.on_progress(progress.percentage);
                        }
                    }
                    MessageType::Done => {
                        observer.on_complete();
                        break;
                    }
                    MessageType::Canceled => {
                        observer.on_canceled();
                        break;
                    }
                    MessageType::Error => {
                        let reason = message
                            .payload_as::<ErrorPayload>()
                            .map(|p| p.reason)
                            .unwrap_or_else(|_| "unknown error".to_string());
                        observer.on_error(&reason);
                        break;
                    }
                    other => {
                        log::warn!("unexpected message type {other:?} for this request");
                    }
                }
            }
        }
    }
}
