//! The cancellation handle shared by a Job, its Workflow, and its Runner —
//! "(parent, deadline)" per the design notes.
//!
//! A single [`CancellationToken`] is the one thing every layer selects on;
//! whichever of "explicit cancel" or "deadline elapsed" happens first wins
//! the race, records why in `reason`, and cancels the token. Everyone
//! downstream reacts to the same signal instead of each layer re-deriving
//! timeout vs. cancel independently.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Timeout,
    Explicit,
}

#[derive(Clone)]
pub struct JobContext {
    cancel_token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl JobContext {
    pub fn new(deadline: Duration) -> Self {
        let cancel_token = CancellationToken::new();
        let reason = Arc::new(OnceLock::new());

        let token = cancel_token.clone();
        let reason_for_timer = reason.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = reason_for_timer.set(CancelReason::Timeout);
            token.cancel();
        });

        Self { cancel_token, reason }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Explicit cancellation (a `CancelRequest`). Idempotent — a second call
    /// is silently ignored, and if the deadline already fired this has no
    /// effect on `reason()`.
    pub fn cancel(&self) {
        let _ = self.reason.set(CancelReason::Explicit);
        self.cancel_token.cancel();
    }

    pub async fn cancelled(&self) {
        self.cancel_token.cancelled().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Why the token was cancelled. Only meaningful after `cancelled()`
    /// resolves; defaults to `Explicit` if called before either source fired
    /// (can't happen through normal job usage).
    pub fn reason(&self) -> CancelReason {
        self.reason.get().copied().unwrap_or(CancelReason::Explicit)
    }
}
