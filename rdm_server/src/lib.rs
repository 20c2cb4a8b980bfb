//! The `rdmd` binary's library half: config loading, startup bootstrap, the
//! WebSocket session (C6/C7), and the axum server (C8). Domain logic lives
//! in `rdm_core`; this crate only adds the transport.

pub mod bootstrap;
pub mod config;
pub mod server;
pub mod session;
