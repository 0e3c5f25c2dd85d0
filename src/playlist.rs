//! Building the ordered list of images the gallery shows.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::loader::MediaItem;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has an extension the decoder understands.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Recursively collect images under `root`, sorted by path.
///
/// Hidden directories below the root are skipped.
pub fn scan_library(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("photo library {} is not a directory", root.display());
    }
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e))
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    found.sort();
    debug!(root = %root.display(), count = found.len(), "scanned photo library");
    Ok(found)
}

/// Explicit images first (in the order given), then the library contents.
///
/// Explicit entries that do not exist are dropped with a warning; the
/// library scan failing is an error.
pub fn build_playlist(explicit: &[PathBuf], library: Option<&Path>) -> Result<Vec<MediaItem>> {
    let mut items = Vec::new();
    for path in explicit {
        if path.is_file() {
            items.push(MediaItem::new(path.clone()));
        } else {
            warn!(path = %path.display(), "skipping missing image");
        }
    }
    if let Some(root) = library {
        items.extend(scan_library(root)?.into_iter().map(MediaItem::new));
    }
    Ok(items)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
