//! Error taxonomy — §7 of the spec.
//!
//! Validation/domain errors are *reported*: they become an `Error{reason}`
//! wire frame and the job terminates, but the server keeps running.
//! Infrastructure failures that would violate I2 (`status=Finished` implies
//! a path) or I3 (no orphaned `Downloading` row) have no safe reported
//! outcome — the protocol offers no "I don't know" response — so they are
//! fatal: logged, then the process exits. This mirrors the original
//! server's `Fatalf` calls in the same spots.

use thiserror::Error;

/// Errors surfaced to a client as a wire `Error{reason}` frame.
#[derive(Debug, Error, Clone)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Domain(String),
    #[error("downloading failed")]
    Downloader,
}

impl WorkflowError {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("no settings row present")]
    NoSettings,
}

/// Log `msg` at error level and terminate the process.
///
/// Used exactly where a DB write failure would leave the database
/// inconsistent with the filesystem (I2/I3) and there is no safe way to
/// report "unknown" to the client.
pub fn fatal(msg: impl std::fmt::Display) -> ! {
    log::error!("fatal: {msg}");
    std::process::exit(1);
}
