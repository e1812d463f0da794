//! Ephemeral resource handles for in-memory content buffers.
//!
//! A handle pairs a byte buffer with an addressable reference, mirroring a
//! browser object-URL: created for a single delivery, revoked once the
//! consuming channel has issued its action.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Ephemeral, revocable reference to an in-memory byte buffer.
///
/// Owned by the delivery channel that requested it; revoked through the
/// emitter that created it.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    reference: String,
    mime_type: String,
    buffer: Arc<Vec<u8>>,
}

impl ResourceHandle {
    /// Addressable reference usable for viewing or downloading.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// MIME type the handle was tagged with.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The underlying byte buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// Creates and revokes addressable resource handles.
pub trait Emitter: Send + Sync {
    /// Build a handle for a byte buffer tagged with a MIME type.
    ///
    /// Never fails: unrecognized MIME types are carried opaquely.
    fn create_handle(&self, buffer: Vec<u8>, mime_type: &str) -> ResourceHandle;

    /// Release a handle. Idempotent: revoking an already-revoked handle is
    /// a no-op.
    fn revoke(&self, handle: &ResourceHandle);
}

/// In-memory emitter issuing `mem://attachment/<n>` references.
///
/// Tracks live references so a session cannot accumulate handles unbounded;
/// every delivery channel revokes what it consumed.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    next_id: AtomicU64,
    live: Mutex<HashSet<String>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().expect("emitter registry poisoned").len()
    }

    /// Whether a reference is still live.
    pub fn is_live(&self, reference: &str) -> bool {
        self.live
            .lock()
            .expect("emitter registry poisoned")
            .contains(reference)
    }
}

impl Emitter for MemoryEmitter {
    fn create_handle(&self, buffer: Vec<u8>, mime_type: &str) -> ResourceHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reference = format!("mem://attachment/{id}");
        self.live
            .lock()
            .expect("emitter registry poisoned")
            .insert(reference.clone());

        debug!(%reference, mime_type, size = buffer.len(), "Created resource handle");
        ResourceHandle {
            reference,
            mime_type: mime_type.to_string(),
            buffer: Arc::new(buffer),
        }
    }

    fn revoke(&self, handle: &ResourceHandle) {
        let removed = self
            .live
            .lock()
            .expect("emitter registry poisoned")
            .remove(handle.reference());
        if removed {
            debug!(reference = %handle.reference(), "Revoked resource handle");
        }
    }
}
