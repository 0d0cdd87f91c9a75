//! Font resolution and text rasterization.
//!
//! Text layers name a font family; faces are discovered by scanning font
//! directories on disk and matching file stems against the requested family.
//! Rasterization draws a single line with ab_glyph outlines, kerned, centered
//! in the layer's base box, with a hard drop shadow behind the fill.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ab_glyph::{point, Font as _, FontArc, GlyphId, ScaleFont as _};
use tiny_skia::{Pixmap, PremultipliedColorU8};
use tracing::warn;

use montage_core::layer::{DEFAULT_FONT_FAMILY, TEXT_FONT_SIZE};

/// Offset of the drop shadow in pixels, applied on both axes.
const SHADOW_OFFSET: f32 = 2.0;

/// Shadow fill, black at 80% opacity.
const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 204];

/// Cache key for the "any available face" lookup.
const ANY_FONT_KEY: &str = "*";

/// Maximum directory depth when scanning for font files.
const MAX_SCAN_DEPTH: usize = 4;

/// Resolves font family names to loaded faces.
///
/// Lookups are cached, including negative results, so a missing family is
/// scanned for at most once.
#[derive(Debug)]
pub struct FontLibrary {
    dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<String, Option<FontArc>>>,
}

impl FontLibrary {
    /// Create a library scanning the given directories.
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create a library scanning the platform's font directories.
    #[must_use]
    pub fn with_system_dirs() -> Self {
        let mut dirs = Vec::new();
        #[cfg(target_os = "linux")]
        {
            dirs.push(PathBuf::from("/usr/share/fonts"));
            dirs.push(PathBuf::from("/usr/local/share/fonts"));
            if let Some(home) = std::env::var_os("HOME") {
                dirs.push(PathBuf::from(home).join(".local/share/fonts"));
            }
        }
        #[cfg(target_os = "macos")]
        {
            dirs.push(PathBuf::from("/System/Library/Fonts"));
            dirs.push(PathBuf::from("/Library/Fonts"));
        }
        #[cfg(target_os = "windows")]
        {
            dirs.push(PathBuf::from("C:\\Windows\\Fonts"));
        }
        Self::new(dirs)
    }

    /// Resolve a family name to a loaded face.
    ///
    /// Returns `None` if no matching font file exists under the library's
    /// directories.
    #[must_use]
    pub fn resolve(&self, family: &str) -> Option<FontArc> {
        let key = normalize(family);
        if key.is_empty() {
            return None;
        }

        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&key) {
                return cached.clone();
            }
        }

        let loaded = self.scan_for(&key);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(key, loaded.clone());
        loaded
    }

    /// Resolve a family, falling back to the default family and then to any
    /// available face.
    #[must_use]
    pub fn resolve_or_fallback(&self, family: &str) -> Option<FontArc> {
        self.resolve(family)
            .or_else(|| self.resolve(DEFAULT_FONT_FAMILY))
            .or_else(|| self.any_font())
    }

    /// Load any face found under the library's directories.
    #[must_use]
    pub fn any_font(&self) -> Option<FontArc> {
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(ANY_FONT_KEY) {
                return cached.clone();
            }
        }

        let mut files = Vec::new();
        for dir in &self.dirs {
            collect_font_files(dir, 0, &mut files);
        }
        let loaded = files.iter().find_map(|path| load_font(path));

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(ANY_FONT_KEY.to_string(), loaded.clone());
        loaded
    }

    /// Scan the directories for a file whose stem matches the normalized
    /// family name. An exact stem match wins; otherwise the shortest stem
    /// containing the family is used, so "impact" prefers `Impact.ttf` over
    /// `ImpactCondensedBold.ttf`.
    fn scan_for(&self, normalized: &str) -> Option<FontArc> {
        let mut partial: Option<(usize, PathBuf)> = None;

        for dir in &self.dirs {
            let mut files = Vec::new();
            collect_font_files(dir, 0, &mut files);
            for path in files {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let stem = normalize(stem);
                if stem == normalized {
                    if let Some(font) = load_font(&path) {
                        return Some(font);
                    }
                } else if stem.contains(normalized) {
                    let better = match &partial {
                        Some((len, _)) => stem.len() < *len,
                        None => true,
                    };
                    if better {
                        partial = Some((stem.len(), path));
                    }
                }
            }
        }

        partial.and_then(|(_, path)| load_font(&path))
    }
}

/// Lowercase a family name and strip everything but letters and digits.
fn normalize(family: &str) -> String {
    family
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("ttf" | "otf")
    )
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, depth + 1, out);
        } else if is_font_file(&path) {
            out.push(path);
        }
    }
}

fn load_font(path: &Path) -> Option<FontArc> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read font file");
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse font file");
            None
        }
    }
}

/// Raster a single line of text centered in a `width` x `height` box.
///
/// The line is drawn at the fixed layer font size with a drop shadow pass
/// underneath the fill. Returns `None` if the box has a zero dimension.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rasterize_text(
    content: &str,
    color: [u8; 4],
    font: &FontArc,
    width: u32,
    height: u32,
) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    if content.is_empty() {
        return Some(pixmap);
    }

    let size = TEXT_FONT_SIZE;
    let scaled = font.as_scaled(size);
    let line_width = measure_line(font, size, content);
    let ascent = scaled.ascent();
    let descent = scaled.descent();

    let origin_x = (width as f32 - line_width) / 2.0;
    let baseline_y = (height as f32 - (ascent - descent)) / 2.0 + ascent;

    draw_line(
        &mut pixmap,
        content,
        font,
        size,
        origin_x + SHADOW_OFFSET,
        baseline_y + SHADOW_OFFSET,
        SHADOW_COLOR,
    );
    draw_line(&mut pixmap, content, font, size, origin_x, baseline_y, color);

    Some(pixmap)
}

/// Advance width of a line at the given size, kerning included.
fn measure_line(font: &FontArc, size: f32, content: &str) -> f32 {
    let scaled = font.as_scaled(size);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in content.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            width += scaled.kern(prev_id, gid);
        }
        width += scaled.h_advance(gid);
        prev = Some(gid);
    }
    width
}

#[allow(clippy::cast_possible_truncation)]
fn draw_line(
    pixmap: &mut Pixmap,
    content: &str,
    font: &FontArc,
    size: f32,
    origin_x: f32,
    baseline_y: f32,
    color: [u8; 4],
) {
    let scaled = font.as_scaled(size);
    let mut pen_x = origin_x;
    let mut prev: Option<GlyphId> = None;

    for ch in content.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev_id) = prev {
            pen_x += scaled.kern(prev_id, gid);
        }
        let glyph = gid.with_scale_and_position(size, point(pen_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                if coverage > 0.0 {
                    let x = bounds.min.x as i32 + gx as i32;
                    let y = bounds.min.y as i32 + gy as i32;
                    blend_pixel(pixmap, x, y, color, coverage.min(1.0));
                }
            });
        }
        pen_x += scaled.h_advance(gid);
        prev = Some(gid);
    }
}

/// Source-over blend of a straight-alpha color scaled by glyph coverage.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_pixel(pixmap: &mut Pixmap, x: i32, y: i32, color: [u8; 4], coverage: f32) {
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    if x < 0 || y < 0 || x >= width || y >= height {
        return;
    }

    let alpha = (f32::from(color[3]) * coverage).round().min(255.0) as u8;
    if alpha == 0 {
        return;
    }
    let inv = 255 - alpha;

    let idx = (y * width + x) as usize;
    let pixels = pixmap.pixels_mut();
    let dst = pixels[idx];

    let r = mul_255(color[0], alpha) + mul_255(dst.red(), inv);
    let g = mul_255(color[1], alpha) + mul_255(dst.green(), inv);
    let b = mul_255(color[2], alpha) + mul_255(dst.blue(), inv);
    let a = alpha + mul_255(dst.alpha(), inv);

    if let Some(blended) = PremultipliedColorU8::from_rgba(r, g, b, a) {
        pixels[idx] = blended;
    }
}

/// Fixed-point `channel * alpha / 255` with round-half-up.
#[allow(clippy::cast_possible_truncation)]
fn mul_255(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
