//! Preview records accumulated in gallery mode.

use crate::emit::ResourceHandle;

/// One previewable attachment prepared for a gallery view.
///
/// Owns its resource handle. The gallery that collected the record is
/// responsible for revoking the handle when the view is released.
#[derive(Debug, Clone)]
pub struct PreviewRecord {
    /// Descriptor id.
    pub id: String,

    /// Synthesized file name.
    pub name: String,

    /// Category shown as the description line.
    pub description: String,

    /// MIME type the preview is tagged with.
    pub mime_type: String,

    /// Handle to the decoded content: byte buffer plus addressable reference.
    pub handle: ResourceHandle,

    /// Ordered presentation metadata: creator name, then formatted
    /// creation date.
    pub metadata: Vec<String>,
}
