//! Content fetch capability and its file-backed implementation.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DeliveryError, Result};
use crate::model::envelope::ContentEnvelope;

/// Asynchronous capability resolving attachment content.
///
/// The pipeline treats this as opaque: it does not retry, inspect transport
/// status, or coordinate concurrent calls. Retry and auth policy belong to
/// the implementation behind this trait.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Resolve the content envelope for one attachment.
    async fn fetch_content(
        &self,
        attachment_id: &str,
        context: &str,
        response_type: &str,
    ) -> Result<ContentEnvelope>;
}

/// File-backed fetcher: one `<id>.json` envelope per attachment.
///
/// Stands in for the remote content service when driving the pipeline from
/// the command line.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    content_dir: PathBuf,
}

impl FsFetcher {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }
}

#[async_trait]
impl ContentFetcher for FsFetcher {
    async fn fetch_content(
        &self,
        attachment_id: &str,
        context: &str,
        _response_type: &str,
    ) -> Result<ContentEnvelope> {
        let path = self.content_dir.join(format!("{attachment_id}.json"));
        debug!(path = %path.display(), context, "Reading content envelope");

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DeliveryError::fetch(attachment_id, e))?;

        serde_json::from_str(&raw)
            .map_err(|e| DeliveryError::fetch(attachment_id, format!("unparseable envelope: {e}")))
    }
}
