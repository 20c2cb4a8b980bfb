use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of wire message types. Numeric values are stable across builds —
/// clients and the server must agree on them independent of field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    DownloadingRequest = 1,
    DownloadingProgress = 2,
    DownloadingDone = 3,
    CancelRequest = 4,
    Canceled = 5,
    Error = 6,
    Done = 7,
    GetFilesRequest = 8,
    GetFilesResponse = 9,
    GetFileRequest = 10,
    GetFileResponse = 11,
    DeleteFilesRequest = 12,
    GetSettingsRequest = 13,
    GetSettingsResponse = 14,
    UpdateSettingsRequest = 15,
    UpdateSettingsResponse = 16,
}

impl MessageType {
    fn from_u16(v: u16) -> Option<Self> {
        use MessageType::*;
        Some(match v {
            1 => DownloadingRequest,
            2 => DownloadingProgress,
            3 => DownloadingDone,
            4 => CancelRequest,
            5 => Canceled,
            6 => Error,
            7 => Done,
            8 => GetFilesRequest,
            9 => GetFilesResponse,
            10 => GetFileRequest,
            11 => GetFileResponse,
            12 => DeleteFilesRequest,
            13 => GetSettingsRequest,
            14 => GetSettingsResponse,
            15 => UpdateSettingsRequest,
            16 => UpdateSettingsResponse,
            _ => return None,
        })
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(*self as u16)
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = u16::deserialize(deserializer)?;
        MessageType::from_u16(v).ok_or_else(|| DeError::custom(format!("unknown message type {v}")))
    }
}

/// Wire header: `{ "type": <int>, "uuid": "<string>" }`. Unknown fields are
/// rejected by the strict decoder in [`super::codec::parse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    #[serde(rename = "type")]
    pub r#type: MessageType,
    pub uuid: String,
}

/// A parsed wire message: header plus an opaque payload. The codec never
/// interprets `payload` — that is left to whichever workflow adapter
/// recognizes `header.type`.
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(r#type: MessageType, uuid: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            header: Header {
                r#type,
                uuid: uuid.into(),
            },
            payload,
        }
    }

    /// Build a message whose payload is `value` serialized as JSON.
    pub fn with_json<T: Serialize>(
        r#type: MessageType,
        uuid: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_vec(value)?;
        Ok(Self::new(r#type, uuid, payload))
    }

    pub fn payload_as<'a, T: Deserialize<'a>>(&'a self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
