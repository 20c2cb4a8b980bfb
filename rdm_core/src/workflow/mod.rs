pub mod downloading;
pub mod event;
pub mod read_only;

pub use event::{WfEvent, WfResult};
