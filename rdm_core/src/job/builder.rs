//! Job Builder — C7. Maps a starting message's type to the adapter that
//! will run it. Kept as its own module even though it is a thin wrapper so
//! the Session (C6) has one obvious place to call into.

use crate::job::adapter::WorkflowAdapter;
use crate::protocol::message::Message;

/// Returns `None` for a message type that cannot start a job (a response
/// type, or `CancelRequest` — which only ever targets an existing job).
pub fn build(start: &Message) -> Option<WorkflowAdapter> {
    WorkflowAdapter::for_message_type(start.header.r#type)
}
