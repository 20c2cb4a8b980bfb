//! Wire frame codec: `uint32_be headerLen | headerJSON | payloadBytes`.
//!
//! Pure and stateless — it never interprets payload bytes, only the header.

use thiserror::Error;

use super::message::{Header, Message};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("buffer too short to contain a header length prefix")]
    ShortBuffer,
    #[error("buffer too short to contain the declared header")]
    ShortHeader,
    #[error("invalid header JSON: {0}")]
    BadHeader(#[source] serde_json::Error),
    #[error("message does not contain a uuid in the header")]
    MissingUuid,
}

const LEN_PREFIX_SIZE: usize = 4;

/// Parse one frame from `data`. `data` must contain exactly one frame —
/// callers are responsible for delimiting frames on the underlying
/// transport (the server reads one WebSocket binary message per frame).
pub fn parse(data: &[u8]) -> Result<Message, CodecError> {
    if data.len() < LEN_PREFIX_SIZE {
        return Err(CodecError::ShortBuffer);
    }

    // Bounds are always `offset..offset + len`, never a bare constant —
    // correct even if this ever reads from a larger buffer at a nonzero offset.
    let offset = 0usize;
    let header_len =
        u32::from_be_bytes(data[offset..offset + LEN_PREFIX_SIZE].try_into().unwrap()) as usize;
    let offset = offset + LEN_PREFIX_SIZE;

    if offset + header_len > data.len() {
        return Err(CodecError::ShortHeader);
    }

    let header_bytes = &data[offset..offset + header_len];
    let offset = offset + header_len;

    let header: Header =
        serde_json::from_slice(header_bytes).map_err(CodecError::BadHeader)?;

    if header.uuid.is_empty() {
        return Err(CodecError::MissingUuid);
    }

    let payload = data[offset..].to_vec();

    Ok(Message { header, payload })
}

/// Serialize a message back to wire bytes. `serialize(parse(b)) == b` for
/// any valid `b` (the header re-encodes to the same bytes because `Header`
/// has exactly two fields and serde_json preserves field order).
pub fn serialize(message: &Message) -> Vec<u8> {
    let header_bytes =
        serde_json::to_vec(&message.header).expect("Header always serializes");

    let mut out = Vec::with_capacity(LEN_PREFIX_SIZE + header_bytes.len() + message.payload.len());
    out.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&message.payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::MessageType;

    fn sample() -> Message {
        Message::new(MessageType::CancelRequest, "abc-123", vec![1, 2, 3])
    }

    #[test]
    fn round_trips() {
        let msg = sample();
        let bytes = serialize(&msg);
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.header.uuid, "abc-123");
        assert_eq!(parsed.header.r#type, MessageType::CancelRequest);
        assert_eq!(parsed.payload, vec![1, 2, 3]);
    }

    #[test]
    fn serialize_parse_is_identity_on_bytes() {
        let msg = sample();
        let bytes = serialize(&msg);
        let reparsed = parse(&bytes).unwrap();
        assert_eq!(serialize(&reparsed), bytes);
    }

    #[test]
    fn rejects_short_length_prefix() {
        assert!(matches!(parse(&[0, 0, 1]), Err(CodecError::ShortBuffer)));
    }

    #[test]
    fn rejects_short_header() {
        let mut bytes = vec![0, 0, 0, 10];
        bytes.extend_from_slice(b"{}");
        assert!(matches!(parse(&bytes), Err(CodecError::ShortHeader)));
    }

    #[test]
    fn rejects_missing_uuid() {
        let header = br#"{"type":4,"uuid":""}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(header.len() as u32).to_be_bytes());
        bytes.extend_from_slice(header);
        assert!(matches!(parse(&bytes), Err(CodecError::MissingUuid)));
    }

    #[test]
    fn rejects_unknown_header_fields() {
        let header = br#"{"type":4,"uuid":"x","extra":1}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(header.len() as u32).to_be_bytes());
        bytes.extend_from_slice(header);
        assert!(matches!(parse(&bytes), Err(CodecError::BadHeader(_))));
    }
}
