//! Integration tests for the attachment delivery pipeline.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{TimeZone, Utc};

use attachrelay::deliver::Pipeline;
use attachrelay::emit::{MemoryEmitter, ResourceHandle};
use attachrelay::error::{DeliveryError, Result};
use attachrelay::fetch::ContentFetcher;
use attachrelay::model::descriptor::{AttachmentDescriptor, DescriptorKind};
use attachrelay::model::envelope::{ContentData, ContentEnvelope, TRANSFER_ENCODING_HEADER};
use attachrelay::surface::DeliverySurface;

// ─── Test doubles ───────────────────────────────────────────────────

/// Everything the pipeline asked the platform to do, in order.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Open(String),
    Save {
        reference: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Surface double recording every platform action.
#[derive(Default)]
struct RecordingSurface {
    actions: Mutex<Vec<Action>>,
}

impl RecordingSurface {
    fn actions(&self) -> Vec<Action> {
        self.actions.lock().expect("actions poisoned").clone()
    }
}

impl DeliverySurface for RecordingSurface {
    fn open_in_new_context(&self, target: &str) -> Result<()> {
        self.actions
            .lock()
            .expect("actions poisoned")
            .push(Action::Open(target.to_string()));
        Ok(())
    }

    fn trigger_save(&self, handle: &ResourceHandle, file_name: &str) -> Result<()> {
        self.actions
            .lock()
            .expect("actions poisoned")
            .push(Action::Save {
                reference: handle.reference().to_string(),
                file_name: file_name.to_string(),
                bytes: handle.buffer().to_vec(),
            });
        Ok(())
    }
}

/// Fetcher double resolving with a fixed envelope.
struct StaticFetcher {
    envelope: ContentEnvelope,
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch_content(&self, _id: &str, _context: &str, _rt: &str) -> Result<ContentEnvelope> {
        Ok(self.envelope.clone())
    }
}

/// Fetcher double that always rejects.
struct FailingFetcher;

#[async_trait]
impl ContentFetcher for FailingFetcher {
    async fn fetch_content(&self, id: &str, _context: &str, _rt: &str) -> Result<ContentEnvelope> {
        Err(DeliveryError::fetch(id, "connection reset"))
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn descriptor(mime_type: &str, kind: DescriptorKind) -> AttachmentDescriptor {
    AttachmentDescriptor {
        id: "A1".into(),
        display_name: "report".into(),
        extension: Some("pdf".into()),
        file_name: "report_full.pdf".into(),
        mime_type: mime_type.into(),
        category_name: "Correspondence".into(),
        created_by_name: "Ana Rivera".into(),
        create_time: Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap(),
        kind,
        response_type: "arraybuffer".into(),
    }
}

fn envelope(encoding: Option<&str>, data: ContentData) -> ContentEnvelope {
    let headers = encoding
        .map(|v| HashMap::from([(TRANSFER_ENCODING_HEADER.to_string(), v.to_string())]));
    ContentEnvelope { headers, data }
}

// ─── Preview channel ────────────────────────────────────────────────

#[tokio::test]
async fn previewable_without_sink_opens_once_and_revokes() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("image/png", DescriptorKind::File);
    let fetcher = StaticFetcher {
        envelope: envelope(Some("binary"), ContentData::Bytes(b"\x89PNG".to_vec())),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    let actions = surface.actions();
    assert_eq!(actions.len(), 1, "exactly one channel action");
    match &actions[0] {
        Action::Open(target) => assert!(target.starts_with("mem://attachment/")),
        other => panic!("expected navigation, got {other:?}"),
    }
    assert_eq!(emitter.live_count(), 0, "handle revoked after navigation");
}

#[tokio::test]
async fn previewable_with_sink_appends_record_and_does_not_navigate() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("image/png", DescriptorKind::File);
    let fetcher = StaticFetcher {
        envelope: envelope(Some("binary"), ContentData::Bytes(b"\x89PNG".to_vec())),
    };

    let mut gallery = Vec::new();
    pipeline
        .deliver(&attachment, &fetcher, "work", Some(&mut gallery))
        .await
        .expect("deliver");

    assert!(surface.actions().is_empty(), "gallery mode never navigates");
    assert_eq!(gallery.len(), 1, "exactly one record appended");

    let record = &gallery[0];
    assert_eq!(record.id, "A1");
    assert_eq!(record.name, "report.pdf");
    assert_eq!(record.description, "Correspondence");
    assert_eq!(record.mime_type, "image/png");
    assert_eq!(record.handle.buffer(), b"\x89PNG");
    assert_eq!(record.metadata, vec!["Ana Rivera", "Mar 4, 2024"]);

    // The sink owns the handle until the caller releases it.
    assert_eq!(emitter.live_count(), 1);
    assert!(emitter.is_live(record.handle.reference()));
}

#[tokio::test]
async fn report_pdf_scenario_navigates_to_decoded_handle() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("application/pdf", DescriptorKind::File);
    let pdf_bytes = b"%PDF-1.7 report body".to_vec();
    let fetcher = StaticFetcher {
        envelope: envelope(Some("base64"), ContentData::Text(STANDARD.encode(&pdf_bytes))),
    };

    let mut opened_reference = None;
    {
        pipeline
            .deliver(&attachment, &fetcher, "work", None)
            .await
            .expect("deliver");
        let actions = surface.actions();
        assert_eq!(actions.len(), 1);
        if let Action::Open(target) = &actions[0] {
            opened_reference = Some(target.clone());
        }
    }

    let reference = opened_reference.expect("navigation fired");
    assert!(reference.starts_with("mem://attachment/"));
    assert!(
        !emitter.is_live(&reference),
        "handle released once navigation was issued"
    );
}

// ─── Download channel ───────────────────────────────────────────────

#[tokio::test]
async fn non_previewable_file_triggers_one_save_and_revokes() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("text/csv", DescriptorKind::File);
    let fetcher = StaticFetcher {
        envelope: envelope(None, ContentData::Text("a,b\n1,2".into())),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    let actions = surface.actions();
    assert_eq!(actions.len(), 1, "exactly one channel action");
    match &actions[0] {
        Action::Save {
            file_name, bytes, ..
        } => {
            assert_eq!(file_name, "report.pdf");
            assert_eq!(bytes, b"a,b\n1,2");
        }
        other => panic!("expected download, got {other:?}"),
    }
    assert_eq!(emitter.live_count(), 0, "handle revoked before returning");
}

#[tokio::test]
async fn download_falls_back_to_full_file_name() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let mut attachment = descriptor("application/zip", DescriptorKind::File);
    attachment.display_name = String::new();
    attachment.extension = None;
    let fetcher = StaticFetcher {
        envelope: envelope(Some("base64"), ContentData::Text(STANDARD.encode(b"PK"))),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    match &surface.actions()[0] {
        Action::Save { file_name, .. } => assert_eq!(file_name, "report_full.pdf"),
        other => panic!("expected download, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_base64_download_is_an_error_with_no_side_effects() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("application/zip", DescriptorKind::File);
    let fetcher = StaticFetcher {
        envelope: envelope(Some("base64"), ContentData::Text("%%%".into())),
    };

    let err = pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Decode(_)));
    assert!(surface.actions().is_empty(), "no channel fired");
    assert_eq!(emitter.live_count(), 0, "no partial handle created");
}

// ─── Link channel ───────────────────────────────────────────────────

#[tokio::test]
async fn url_descriptor_navigates_without_decoding() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("image/png", DescriptorKind::Url);
    // The payload is not valid base64 and the headers claim base64: if the
    // link path ever invoked the decoder this would fail.
    let fetcher = StaticFetcher {
        envelope: envelope(Some("base64"), ContentData::Text("example.com/doc".into())),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    assert_eq!(
        surface.actions(),
        vec![Action::Open("//example.com/doc".to_string())],
        "bare hosts become protocol-relative"
    );
    assert_eq!(emitter.live_count(), 0, "link navigation emits no handle");
}

#[tokio::test]
async fn url_with_scheme_is_navigated_unchanged() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("", DescriptorKind::Url);
    let fetcher = StaticFetcher {
        envelope: envelope(None, ContentData::Text("https://example.com/doc".into())),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    assert_eq!(
        surface.actions(),
        vec![Action::Open("https://example.com/doc".to_string())]
    );
}

// ─── Failure propagation ────────────────────────────────────────────

#[tokio::test]
async fn fetch_failure_propagates_with_no_side_effects() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("application/pdf", DescriptorKind::File);
    let err = pipeline
        .deliver(&attachment, &FailingFetcher, "work", None)
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Fetch { .. }));
    assert!(surface.actions().is_empty());
    assert_eq!(emitter.live_count(), 0);
}

#[tokio::test]
async fn failed_dispatch_does_not_poison_later_dispatches() {
    let emitter = MemoryEmitter::new();
    let surface = RecordingSurface::default();
    let pipeline = Pipeline::new(&emitter, &surface);

    let attachment = descriptor("application/pdf", DescriptorKind::File);
    pipeline
        .deliver(&attachment, &FailingFetcher, "work", None)
        .await
        .unwrap_err();

    let fetcher = StaticFetcher {
        envelope: envelope(Some("binary"), ContentData::Bytes(b"%PDF".to_vec())),
    };
    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("second dispatch is independent");

    assert_eq!(surface.actions().len(), 1);
}

// ─── End to end through the local surface ───────────────────────────

#[tokio::test]
async fn download_through_local_surface_writes_the_file() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let dir = assert_fs::TempDir::new().expect("tempdir");
    let emitter = MemoryEmitter::new();
    let surface = attachrelay::surface::LocalSurface::new(dir.path());
    let pipeline = Pipeline::new(&emitter, &surface);

    let mut attachment = descriptor("application/zip", DescriptorKind::File);
    attachment.display_name = "archive".into();
    attachment.extension = Some("zip".into());
    let fetcher = StaticFetcher {
        envelope: envelope(Some("base64"), ContentData::Text(STANDARD.encode(b"PK\x03\x04"))),
    };

    pipeline
        .deliver(&attachment, &fetcher, "work", None)
        .await
        .expect("deliver");

    dir.child("archive.zip")
        .assert(predicate::path::exists());
    assert_eq!(
        std::fs::read(dir.path().join("archive.zip")).expect("read back"),
        b"PK\x03\x04"
    );
    assert_eq!(emitter.live_count(), 0);
}
