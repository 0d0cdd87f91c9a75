//! Background image library.
//!
//! Backgrounds are loaded from a directory at startup and served to
//! editors as base64 data URIs. Files sort naturally (`bg2` before
//! `bg10`) so numbered sets keep their intended order. When the
//! directory is missing or holds no images, a single generated
//! charcoal background stands in so the editor always has something to
//! draw on.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use montage_render::{encode_data_uri, ImageData, ImageFormat, RenderResult};
use tracing::warn;

/// Load the background list for new sessions.
///
/// Returns data URIs in natural filename order. Never returns an empty
/// list unless even the fallback image fails to encode.
pub fn load_backgrounds(dir: Option<&Path>, canvas_width: u32, canvas_height: u32) -> Vec<String> {
    let mut backgrounds = dir.map(scan_directory).unwrap_or_default();
    if backgrounds.is_empty() {
        match fallback_background(canvas_width, canvas_height) {
            Ok(uri) => {
                warn!("No background images found, using a generated fallback");
                backgrounds.push(uri);
            }
            Err(e) => warn!("Failed to generate fallback background: {e}"),
        }
    }
    backgrounds
}

fn scan_directory(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read background directory {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    paths.sort_by(|a, b| natural_cmp(&file_name_lower(a), &file_name_lower(b)));

    paths.iter().filter_map(|path| read_as_data_uri(path)).collect()
}

fn fallback_background(width: u32, height: u32) -> RenderResult<String> {
    ImageData::solid_color(width.max(1), height.max(1), 58, 58, 58, 255).to_data_uri()
}

/// True if the path carries a known image extension.
pub(crate) fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| !matches!(ImageFormat::from_extension(ext), ImageFormat::Unknown))
}

/// Read a file and wrap it in a data URI for its extension's MIME type.
/// Unreadable files are skipped with a warning.
pub(crate) fn read_as_data_uri(path: &Path) -> Option<String> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(ImageFormat::from_extension)
        .unwrap_or(ImageFormat::Unknown);
    if matches!(format, ImageFormat::Unknown) {
        return None;
    }
    match fs::read(path) {
        Ok(bytes) => Some(encode_data_uri(format.mime_type(), &bytes)),
        Err(e) => {
            warn!("Skipping unreadable image {}: {e}", path.display());
            None
        }
    }
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Compare filenames chunk by chunk, treating digit runs as numbers.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a;
    let mut right = b;
    loop {
        match (left.is_empty(), right.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        let (l_chunk, l_rest) = take_chunk(left);
        let (r_chunk, r_rest) = take_chunk(right);
        let ord = match (chunk_number(l_chunk), chunk_number(r_chunk)) {
            // Equal values with different spellings (leading zeros)
            // still need a stable order
            (Some(ln), Some(rn)) => ln.cmp(&rn).then_with(|| l_chunk.cmp(r_chunk)),
            _ => l_chunk.cmp(r_chunk),
        };
        if ord != Ordering::Equal {
            return ord;
        }
        left = l_rest;
        right = r_rest;
    }
}

fn take_chunk(s: &str) -> (&str, &str) {
    let digits = s.chars().next().is_some_and(|c| c.is_ascii_digit());
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digits)
        .map_or(s.len(), |(i, _)| i);
    s.split_at(end)
}

fn chunk_number(chunk: &str) -> Option<u64> {
    if chunk.is_empty() || !chunk.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Saturate on absurdly long digit runs instead of overflowing
    Some(chunk.bytes().fold(0u64, |acc, byte| {
        acc.saturating_mul(10).saturating_add(u64::from(byte - b'0'))
    }))
}
