//! Content envelope returned by the remote attachment service.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The only transport header the pipeline recognizes.
pub const TRANSFER_ENCODING_HEADER: &str = "content-transfer-encoding";

/// Payload of a content envelope.
///
/// The service returns either a raw byte sequence (binary transfer) or a
/// string (base64 or plain text).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentData {
    /// Payload delivered as a string.
    Text(String),
    /// Payload already delivered as a byte sequence.
    Bytes(Vec<u8>),
}

impl ContentData {
    /// The payload's raw bytes, regardless of representation.
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// The payload as text, for link navigation.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes),
            Self::Text(text) => Cow::Borrowed(text.as_str()),
        }
    }
}

/// Raw content plus transport metadata, consumed once per dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEnvelope {
    /// Transport headers. An absent map is equivalent to an empty one.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// The payload itself.
    pub data: ContentData,
}

impl ContentEnvelope {
    /// Look up the transfer-encoding header value, if any.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.headers
            .as_ref()?
            .get(TRANSFER_ENCODING_HEADER)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_envelope() {
        let raw = r#"{"headers": {"content-transfer-encoding": "base64"}, "data": "aGVsbG8="}"#;
        let envelope: ContentEnvelope = serde_json::from_str(raw).expect("valid envelope");
        assert_eq!(envelope.transfer_encoding(), Some("base64"));
        assert!(matches!(envelope.data, ContentData::Text(_)));
    }

    #[test]
    fn test_parse_byte_envelope() {
        let raw = r#"{"headers": {"content-transfer-encoding": "binary"}, "data": [37, 80, 68, 70]}"#;
        let envelope: ContentEnvelope = serde_json::from_str(raw).expect("valid envelope");
        assert_eq!(envelope.data.raw_bytes(), b"%PDF");
    }

    #[test]
    fn test_missing_headers_is_none() {
        let raw = r#"{"data": "plain body"}"#;
        let envelope: ContentEnvelope = serde_json::from_str(raw).expect("valid envelope");
        assert!(envelope.headers.is_none());
        assert_eq!(envelope.transfer_encoding(), None);
    }

    #[test]
    fn test_empty_headers_behave_like_missing() {
        let raw = r#"{"headers": {}, "data": "plain body"}"#;
        let envelope: ContentEnvelope = serde_json::from_str(raw).expect("valid envelope");
        assert_eq!(envelope.transfer_encoding(), None);
    }

    #[test]
    fn test_bytes_as_text_is_lossy() {
        let data = ContentData::Bytes(b"example.com/doc".to_vec());
        assert_eq!(data.as_text(), "example.com/doc");
    }
}
