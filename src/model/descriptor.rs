//! Attachment descriptor metadata.
//!
//! Descriptors are supplied by the caller and never mutated by the
//! pipeline. Content is fetched separately, per dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeliveryError, Result};

/// How an attachment's content payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriptorKind {
    /// The payload is file content to decode and deliver.
    File,
    /// The payload is a link target; it is never decoded.
    Url,
}

/// Metadata about a single case attachment.
///
/// The field set is closed: JSON with unknown fields is rejected at parse
/// time instead of silently dropping data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttachmentDescriptor {
    /// Opaque identifier, unique within a context.
    pub id: String,

    /// Base name shown to the user, without extension.
    pub display_name: String,

    /// File extension, if known.
    #[serde(default)]
    pub extension: Option<String>,

    /// Precomputed full file name. Used whenever `display_name` and
    /// `extension` do not form a complete name on their own.
    pub file_name: String,

    /// MIME content type (e.g. `"image/png"`, `"application/pdf"`).
    pub mime_type: String,

    /// Category shown as the preview description.
    pub category_name: String,

    /// Display name of the user who attached the file.
    pub created_by_name: String,

    /// When the attachment was created.
    pub create_time: DateTime<Utc>,

    /// Content interpretation: file bytes or link target.
    #[serde(rename = "descriptorType")]
    pub kind: DescriptorKind,

    /// Forwarded verbatim to the content service.
    pub response_type: String,
}

impl AttachmentDescriptor {
    /// Parse and validate a descriptor from JSON.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| DeliveryError::InvalidDescriptor(e.to_string()))
    }

    /// Synthesize the file name used for previews and downloads.
    ///
    /// `display_name.extension` when both parts are nonempty, otherwise the
    /// precomputed `file_name`.
    pub fn delivery_file_name(&self) -> String {
        match self.extension.as_deref() {
            Some(ext) if !ext.is_empty() && !self.display_name.is_empty() => {
                format!("{}.{}", self.display_name, ext)
            }
            _ => self.file_name.clone(),
        }
    }
}
