//! Delivery surface: the platform-boundary open and save primitives.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::emit::ResourceHandle;
use crate::error::{DeliveryError, Result};

/// Platform actions the pipeline invokes but does not implement.
pub trait DeliverySurface: Send + Sync {
    /// Open a target reference in a new viewing context.
    fn open_in_new_context(&self, target: &str) -> Result<()>;

    /// Trigger a save-to-disk for the handle under `file_name`.
    ///
    /// Fire-and-forget: completion is not awaited or confirmed.
    fn trigger_save(&self, handle: &ResourceHandle, file_name: &str) -> Result<()>;
}

/// Local filesystem surface used by the CLI.
///
/// A terminal has no viewing context to spawn, so opens are logged; saves
/// are written into the download directory, de-duplicating name collisions
/// with a numeric suffix.
#[derive(Debug, Clone)]
pub struct LocalSurface {
    download_dir: PathBuf,
}

impl LocalSurface {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }
}

impl DeliverySurface for LocalSurface {
    fn open_in_new_context(&self, target: &str) -> Result<()> {
        info!(%target, "Opening in new viewing context");
        Ok(())
    }

    fn trigger_save(&self, handle: &ResourceHandle, file_name: &str) -> Result<()> {
        std::fs::create_dir_all(&self.download_dir)
            .map_err(|e| DeliveryError::io(&self.download_dir, e))?;

        let name = sanitize_file_name(file_name);
        let path = unique_path(&self.download_dir.join(name));
        std::fs::write(&path, handle.buffer()).map_err(|e| DeliveryError::io(&path, e))?;

        info!(path = %path.display(), size = handle.buffer().len(), "Saved attachment");
        Ok(())
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['.', ' ']).is_empty() {
        "attachment".to_string()
    } else {
        sanitized
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    // Fallback — very unlikely
    parent.join(format!("{stem}_dup.{ext}"))
}
