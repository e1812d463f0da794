//! Delivery dispatcher: fetch, classify, decode, and route to one channel.

use tracing::{debug, info};

use crate::classify::classify;
use crate::decode;
use crate::emit::Emitter;
use crate::error::Result;
use crate::fetch::ContentFetcher;
use crate::model::descriptor::{AttachmentDescriptor, DescriptorKind};
use crate::model::envelope::ContentEnvelope;
use crate::model::preview::PreviewRecord;
use crate::surface::DeliverySurface;

/// Date format for the preview metadata line.
const PREVIEW_DATE_FORMAT: &str = "%b %-d, %Y";

/// Routes fetched attachment content to exactly one delivery channel:
/// inline preview, link navigation, or file download.
///
/// Each [`deliver`](Pipeline::deliver) call is independent: it suspends only
/// while the fetch capability resolves, then runs synchronously to
/// completion. There is no cancellation and no de-duplication of concurrent
/// calls for the same attachment.
pub struct Pipeline<'a> {
    emitter: &'a dyn Emitter,
    surface: &'a dyn DeliverySurface,
}

impl<'a> Pipeline<'a> {
    pub fn new(emitter: &'a dyn Emitter, surface: &'a dyn DeliverySurface) -> Self {
        Self { emitter, surface }
    }

    /// Deliver one attachment.
    ///
    /// Link descriptors navigate without decoding. File descriptors are
    /// classified by MIME type: previewable kinds (image, pdf) go to the
    /// gallery `sink` when one is supplied, otherwise open in a new viewing
    /// context; everything else downloads under its synthesized file name.
    ///
    /// On any failure no channel fires and no handle outlives the call.
    pub async fn deliver(
        &self,
        attachment: &AttachmentDescriptor,
        fetcher: &dyn ContentFetcher,
        context: &str,
        sink: Option<&mut Vec<PreviewRecord>>,
    ) -> Result<()> {
        let envelope = fetcher
            .fetch_content(&attachment.id, context, &attachment.response_type)
            .await?;

        // Link payloads are navigation targets, never content to decode.
        if attachment.kind == DescriptorKind::Url {
            return self.navigate(&envelope);
        }

        let kind = classify(&attachment.mime_type);
        debug!(id = %attachment.id, mime_type = %attachment.mime_type, %kind, "Classified attachment");

        if kind.is_previewable() {
            self.preview(attachment, &envelope, sink)
        } else {
            self.download(attachment, &envelope)
        }
    }

    fn preview(
        &self,
        attachment: &AttachmentDescriptor,
        envelope: &ContentEnvelope,
        sink: Option<&mut Vec<PreviewRecord>>,
    ) -> Result<()> {
        let buffer = decode::decode(envelope)?;
        let handle = self.emitter.create_handle(buffer, &attachment.mime_type);

        match sink {
            Some(sink) => {
                info!(id = %attachment.id, reference = %handle.reference(), "Collecting preview");
                sink.push(PreviewRecord {
                    id: attachment.id.clone(),
                    name: attachment.delivery_file_name(),
                    description: attachment.category_name.clone(),
                    mime_type: attachment.mime_type.clone(),
                    metadata: vec![
                        attachment.created_by_name.clone(),
                        attachment
                            .create_time
                            .format(PREVIEW_DATE_FORMAT)
                            .to_string(),
                    ],
                    handle,
                });
                Ok(())
            }
            None => {
                info!(id = %attachment.id, reference = %handle.reference(), "Opening preview");
                let result = self.surface.open_in_new_context(handle.reference());
                self.emitter.revoke(&handle);
                result
            }
        }
    }

    fn navigate(&self, envelope: &ContentEnvelope) -> Result<()> {
        let target = link_target(&envelope.data.as_text());
        info!(%target, "Navigating to attachment link");
        self.surface.open_in_new_context(&target)
    }

    fn download(&self, attachment: &AttachmentDescriptor, envelope: &ContentEnvelope) -> Result<()> {
        let buffer = decode::decode(envelope)?;
        let handle = self.emitter.create_handle(buffer, &attachment.mime_type);
        let name = attachment.delivery_file_name();

        info!(id = %attachment.id, %name, "Triggering file download");
        let result = self.surface.trigger_save(&handle, &name);
        self.emitter.revoke(&handle);
        result
    }
}

/// Make a schemeless link protocol-relative so it is not resolved as a
/// relative path.
fn link_target(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("//{raw}")
    }
}
