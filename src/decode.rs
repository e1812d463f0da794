//! Transfer-encoding decoding of content envelopes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::Result;
use crate::model::envelope::ContentEnvelope;

/// Recognized content-transfer-encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Payload is already a byte sequence; passed through unchanged.
    Binary,
    /// Payload is a base64 string.
    Base64,
    /// Payload is plain text, encoded to bytes as UTF-8.
    Plain,
}

impl TransferEncoding {
    /// Determine the encoding from envelope headers.
    ///
    /// An absent header map, an absent key, and an unrecognized value all
    /// mean plain text.
    pub fn from_envelope(envelope: &ContentEnvelope) -> Self {
        match envelope.transfer_encoding() {
            Some("binary") => Self::Binary,
            Some("base64") => Self::Base64,
            _ => Self::Plain,
        }
    }
}

/// Normalize an envelope payload into a byte buffer.
///
/// Invoked on the preview and download paths only; link navigation never
/// decodes. Malformed base64 surfaces as [`crate::error::DeliveryError::Decode`]
/// with no recovery attempt.
pub fn decode(envelope: &ContentEnvelope) -> Result<Vec<u8>> {
    let encoding = TransferEncoding::from_envelope(envelope);
    debug!(?encoding, size = envelope.data.raw_bytes().len(), "Decoding envelope payload");

    match encoding {
        TransferEncoding::Binary | TransferEncoding::Plain => {
            Ok(envelope.data.raw_bytes().to_vec())
        }
        TransferEncoding::Base64 => Ok(STANDARD.decode(envelope.data.raw_bytes())?),
    }
}
