//! Saved-creation gallery.
//!
//! Exported scenes land on disk under a random UUID filename and the
//! most recent handful can be listed back as data URIs. Persistence is
//! best effort at the API level: an export still succeeds even when the
//! gallery write fails, so the error type here stays narrow.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::library;

/// Maximum number of creations returned by the recent listing.
pub const RECENT_LIMIT: usize = 5;

/// Errors that can occur when persisting a creation.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Writing the creation to disk failed.
    #[error("Failed to persist creation: {0}")]
    Persist(#[from] std::io::Error),
}

/// Result alias for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;

/// On-disk store of exported creations.
#[derive(Debug, Clone)]
pub struct Gallery {
    dir: PathBuf,
}

impl Gallery {
    /// Open a gallery rooted at the given directory, creating it if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> GalleryResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory backing this gallery.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist encoded image bytes under a fresh UUID filename.
    /// Returns the filename.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, bytes: &[u8], extension: &str) -> GalleryResult<String> {
        let filename = format!("{}.{extension}", Uuid::new_v4());
        let path = self.dir.join(&filename);
        fs::write(&path, bytes)?;
        info!("Saved creation {}", path.display());
        Ok(filename)
    }

    /// The most recently saved creations, newest first, as data URIs.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Failed to read gallery directory {}: {e}",
                    self.dir.display()
                );
                return Vec::new();
            }
        };

        let mut files: Vec<(std::time::SystemTime, PathBuf)> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && library::is_image_file(path))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
                Some((modified, path))
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0));

        files
            .iter()
            .take(limit)
            .filter_map(|(_, path)| library::read_as_data_uri(path))
            .collect()
    }
}
