pub mod codec;
pub mod message;
pub mod payloads;

pub use codec::{parse, serialize, CodecError};
pub use message::{Header, Message, MessageType};
