//! Scene compositing and export encoding.
//!
//! The compositor flattens a scene snapshot back-to-front: background first
//! (cover-fit), then layers in insertion order, then the freehand drawing
//! overlay at full canvas size. Raster sources go through the decoded-image
//! cache and are drawn with one affine transform per layer; stickers are
//! vector paths painted under the same transform.

use std::sync::{Mutex, PoisonError};

use image::ImageEncoder;
use montage_core::color::parse_hex;
use montage_core::{Layer, LayerKind, SceneSnapshot};
use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::warn;

use crate::cache::{CacheStats, ImageCache, ImageCacheConfig};
use crate::error::{RenderError, RenderResult};
use crate::text::FontLibrary;
use crate::{sticker, text};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image, flattened onto the configured backdrop.
    Jpeg,
}

impl ExportFormat {
    /// Parse a format name such as `png` or `jpeg`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// MIME type for the encoded bytes.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Configuration for scene compositing.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    /// JPEG quality 1-100.
    pub jpeg_quality: u8,
    /// Backdrop color JPEG output is flattened onto.
    pub jpeg_background: [u8; 3],
    /// Decoded-image cache limits.
    pub cache: ImageCacheConfig,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            jpeg_background: [255, 255, 255],
            cache: ImageCacheConfig::default(),
        }
    }
}

/// Flattens scene snapshots into pixels and encodes them for export.
pub struct Compositor {
    config: ComposeConfig,
    fonts: FontLibrary,
    cache: Mutex<ImageCache>,
}

impl Compositor {
    /// Create a compositor with the given configuration and font library.
    #[must_use]
    pub fn new(config: ComposeConfig, fonts: FontLibrary) -> Self {
        let cache = Mutex::new(ImageCache::with_config(config.cache.clone()));
        Self {
            config,
            fonts,
            cache,
        }
    }

    /// Create a compositor with default configuration and system fonts.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ComposeConfig::default(), FontLibrary::with_system_dirs())
    }

    /// The font library used for text layers.
    #[must_use]
    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Snapshot of the decoded-image cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
            .clone()
    }

    /// Flatten a scene snapshot into a premultiplied pixmap.
    ///
    /// Text layers whose font family cannot be resolved to any face are
    /// skipped with a warning rather than failing the whole frame.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotReady`] if the canvas dimensions cannot
    /// back a render target, and [`RenderError::Resource`] if the background
    /// or a layer source fails to decode.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compose(&self, snapshot: &SceneSnapshot) -> RenderResult<Pixmap> {
        let width = snapshot.canvas_width;
        let height = snapshot.canvas_height;
        let mut output = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::NotReady(format!("cannot allocate a {width}x{height} render target"))
        })?;

        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let background = cache.get_or_decode(&snapshot.background)?;
        let cover = Self::cover_transform(background.width(), background.height(), width, height);
        output.draw_pixmap(0, 0, background.as_ref(), &paint, cover, None);

        for layer in &snapshot.layers {
            match &layer.kind {
                LayerKind::Image { src } => {
                    let source = cache.get_or_decode(src)?;
                    let transform = Self::layer_transform(
                        layer,
                        source.width() as f32,
                        source.height() as f32,
                    );
                    output.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
                }
                LayerKind::Text {
                    content,
                    color,
                    font_family,
                } => {
                    let Some(font) = self.fonts.resolve_or_fallback(font_family) else {
                        warn!(
                            layer = %layer.id,
                            family = %font_family,
                            "no usable font face, skipping text layer"
                        );
                        continue;
                    };
                    let rgba = parse_hex(color).unwrap_or([255, 255, 255, 255]);
                    let Some(rendered) = text::rasterize_text(
                        content,
                        rgba,
                        &font,
                        layer.width.ceil() as u32,
                        layer.height.ceil() as u32,
                    ) else {
                        continue;
                    };
                    let transform = Self::layer_transform(
                        layer,
                        rendered.width() as f32,
                        rendered.height() as f32,
                    );
                    output.draw_pixmap(0, 0, rendered.as_ref(), &paint, transform, None);
                }
                LayerKind::Sticker { kind } => {
                    let base = kind.base_size();
                    let transform = Self::layer_transform(layer, base.width, base.height);
                    sticker::draw(*kind, &mut output, transform);
                }
            }
        }
        drop(cache);

        if let Some(drawing) = &snapshot.drawing {
            output.draw_pixmap(
                0,
                0,
                drawing.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        Ok(output)
    }

    /// Flatten and encode a scene snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if compositing or encoding fails.
    pub fn export(&self, snapshot: &SceneSnapshot, format: ExportFormat) -> RenderResult<Vec<u8>> {
        let pixmap = self.compose(snapshot)?;
        match format {
            ExportFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}"))),
            ExportFormat::Jpeg => self.encode_jpeg(&pixmap),
        }
    }

    /// Encode a composited pixmap as JPEG, flattening alpha onto the
    /// configured backdrop.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_jpeg(&self, pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = self.config.jpeg_background;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.data().chunks_exact(4) {
            // Pixels are premultiplied, so source-over needs no extra multiply.
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            rgb_data.push(f32::from(bg[0]).mul_add(inv, f32::from(pixel[0])).min(255.0) as u8);
            rgb_data.push(f32::from(bg[1]).mul_add(inv, f32::from(pixel[1])).min(255.0) as u8);
            rgb_data.push(f32::from(bg[2]).mul_add(inv, f32::from(pixel[2])).min(255.0) as u8);
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf,
            self.config.jpeg_quality,
        );
        encoder
            .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Affine transform mapping a source pixmap onto the canvas for a layer.
    ///
    /// The source is scaled to the layer's rendered size and rotated about
    /// the rendered box center.
    fn layer_transform(layer: &Layer, src_width: f32, src_height: f32) -> Transform {
        let rendered = layer.rendered_size();
        let scale_x = rendered.width / src_width;
        let scale_y = rendered.height / src_height;

        let radians = layer.rotation.to_radians();
        let (sin, cos) = radians.sin_cos();

        let a = cos * scale_x;
        let b = sin * scale_x;
        let c = -sin * scale_y;
        let d = cos * scale_y;

        let center = layer.center();
        let half_w = src_width / 2.0;
        let half_h = src_height / 2.0;
        let tx = center.x - (a * half_w + c * half_h);
        let ty = center.y - (b * half_w + d * half_h);

        Transform::from_row(a, b, c, d, tx, ty)
    }

    /// Uniformly scale a source to cover the canvas, centering the overflow.
    #[allow(clippy::cast_precision_loss)]
    fn cover_transform(
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    ) -> Transform {
        let src_w = src_width.max(1) as f32;
        let src_h = src_height.max(1) as f32;
        let scale = (dst_width as f32 / src_w).max(dst_height as f32 / src_h);
        let tx = (dst_width as f32 - src_w * scale) / 2.0;
        let ty = (dst_height as f32 - src_h * scale) / 2.0;
        Transform::from_row(scale, 0.0, 0.0, scale, tx, ty)
    }
}

#[cfg(test)]
mod tests {
    use montage_core::{DrawingSurface, Point};

    use super::*;
    use crate::image::ImageData;

    fn solid_uri(width: u32, height: u32, r: u8, g: u8, b: u8) -> String {
        ImageData::solid_color(width, height, r, g, b, 255)
            .to_data_uri()
            .expect("data uri")
    }

    fn compositor() -> Compositor {
        Compositor::new(ComposeConfig::default(), FontLibrary::new(Vec::new()))
    }

    fn snapshot(background: String, width: u32, height: u32) -> SceneSnapshot {
        SceneSnapshot {
            background,
            layers: Vec::new(),
            drawing: None,
            canvas_width: width,
            canvas_height: height,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> tiny_skia::PremultipliedColorU8 {
        pixmap.pixels()[(y * pixmap.width() + x) as usize]
    }

    #[test]
    fn zero_canvas_is_not_ready() {
        let scene = snapshot(solid_uri(2, 2, 0, 0, 0), 0, 100);
        let err = compositor().compose(&scene).expect_err("must fail");
        assert!(matches!(err, RenderError::NotReady(_)));
    }

    #[test]
    fn undecodable_background_is_a_resource_error() {
        let scene = snapshot("data:image/png;base64,AAAA".to_string(), 10, 10);
        let err = compositor().compose(&scene).expect_err("must fail");
        assert!(matches!(err, RenderError::Resource(_)));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn same_size_background_copies_through() {
        let mut image = ImageData::solid_color(8, 8, 0, 0, 0, 255);
        // Vary the pixels so a shifted or scaled copy would not match.
        for (idx, px) in image.data.chunks_exact_mut(4).enumerate() {
            px[0] = (idx * 3 % 256) as u8;
            px[1] = (idx * 7 % 256) as u8;
        }
        let scene = snapshot(image.to_data_uri().expect("uri"), 8, 8);

        let output = compositor().compose(&scene).expect("compose");
        assert_eq!(output.data(), image.data.as_slice());
    }

    #[test]
    fn wide_background_covers_and_center_crops() {
        let mut image = ImageData::solid_color(8, 4, 255, 0, 0, 255);
        // Right half blue.
        for (idx, px) in image.data.chunks_exact_mut(4).enumerate() {
            if idx % 8 >= 4 {
                px.copy_from_slice(&[0, 0, 255, 255]);
            }
        }
        let scene = snapshot(image.to_data_uri().expect("uri"), 4, 4);

        let output = compositor().compose(&scene).expect("compose");
        // Middle four columns of the source remain: two red, two blue.
        assert!(pixel(&output, 0, 2).red() > 200);
        assert!(pixel(&output, 3, 2).blue() > 200);
    }

    #[test]
    fn image_layer_lands_at_its_position() {
        let mut scene = snapshot(solid_uri(20, 20, 0, 0, 0), 20, 20);
        let mut layer = Layer::image(solid_uri(4, 4, 0, 255, 0), 4, 4);
        layer.width = 4.0;
        layer.height = 4.0;
        layer.position = Point::new(8.0, 8.0);
        scene.layers.push(layer);

        let output = compositor().compose(&scene).expect("compose");
        assert!(pixel(&output, 9, 9).green() > 200);
        assert_eq!(pixel(&output, 2, 2).green(), 0);
    }

    #[test]
    fn scale_multiplies_the_rendered_footprint() {
        let mut scene = snapshot(solid_uri(20, 20, 0, 0, 0), 20, 20);
        let mut layer = Layer::image(solid_uri(4, 4, 0, 255, 0), 4, 4);
        layer.width = 4.0;
        layer.height = 4.0;
        layer.position = Point::new(2.0, 2.0);
        layer.scale = 3.0;
        scene.layers.push(layer);

        let output = compositor().compose(&scene).expect("compose");
        // Rendered box is 12x12 from (2, 2); (12, 12) is inside it.
        assert!(pixel(&output, 12, 12).green() > 200);
        assert_eq!(pixel(&output, 16, 16).green(), 0);
    }

    #[test]
    fn rotation_pivots_at_the_rendered_center() {
        let mut scene = snapshot(solid_uri(20, 20, 0, 0, 0), 20, 20);
        let mut layer = Layer::image(solid_uri(6, 2, 0, 0, 255), 6, 2);
        layer.width = 6.0;
        layer.height = 2.0;
        layer.position = Point::new(7.0, 9.0); // center lands on (10, 10)
        layer.rotation = 90.0;
        scene.layers.push(layer);

        let output = compositor().compose(&scene).expect("compose");
        // After rotating about the center the box stands upright.
        assert!(pixel(&output, 10, 7).blue() > 200);
        assert!(pixel(&output, 10, 12).blue() > 200);
        assert_eq!(pixel(&output, 7, 10).blue(), 0);
        assert_eq!(pixel(&output, 12, 10).blue(), 0);
    }

    #[test]
    fn layers_composite_in_insertion_order() {
        let mut scene = snapshot(solid_uri(10, 10, 0, 0, 0), 10, 10);
        for (r, b) in [(255, 0), (0, 255)] {
            let mut layer = Layer::image(solid_uri(4, 4, r, 0, b), 4, 4);
            layer.width = 4.0;
            layer.height = 4.0;
            layer.position = Point::new(3.0, 3.0);
            scene.layers.push(layer);
        }

        let output = compositor().compose(&scene).expect("compose");
        let overlap = pixel(&output, 5, 5);
        assert!(overlap.blue() > 200, "later layer must win the overlap");
        assert_eq!(overlap.red(), 0);
    }

    #[test]
    fn sticker_layer_renders_without_raster_source() {
        let mut scene = snapshot(solid_uri(120, 120, 0, 0, 0), 120, 120);
        let mut layer = Layer::sticker(montage_core::StickerKind::Crown);
        layer.position = Point::new(20.0, 20.0);
        scene.layers.push(layer);

        let output = compositor().compose(&scene).expect("compose");
        let painted = output
            .pixels()
            .iter()
            .filter(|p| p.red() > 100 && p.green() > 80 && p.blue() < 90)
            .count();
        assert!(painted > 0, "crown gold must reach the canvas");
    }

    #[test]
    fn missing_font_skips_the_text_layer() {
        let mut scene = snapshot(solid_uri(30, 30, 255, 0, 0), 30, 30);
        scene.layers.push(Layer::text());

        let output = compositor().compose(&scene).expect("compose");
        assert!(pixel(&output, 15, 15).red() > 200, "background intact");
    }

    #[test]
    fn drawing_overlay_lands_on_top() {
        let mut surface = DrawingSurface::new(20, 20).expect("surface");
        surface.begin_stroke(Point::new(5.0, 10.0), [0, 255, 0, 255], 3.0);
        surface.extend_stroke(Point::new(15.0, 10.0));
        surface.end_stroke();

        let mut scene = snapshot(solid_uri(20, 20, 0, 0, 0), 20, 20);
        scene.drawing = Some(surface.pixmap().clone());

        let output = compositor().compose(&scene).expect("compose");
        assert!(pixel(&output, 10, 10).green() > 200);
    }

    #[test]
    fn export_encodes_magic_bytes() {
        let scene = snapshot(solid_uri(10, 10, 1, 2, 3), 10, 10);
        let compositor = compositor();

        let png = compositor.export(&scene, ExportFormat::Png).expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);

        let jpeg = compositor.export(&scene, ExportFormat::Jpeg).expect("jpeg");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(ExportFormat::from_name("png"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_name("PNG"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_name("jpg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_name("jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_name("webp"), None);
        assert_eq!(ExportFormat::Jpeg.extension(), "jpg");
        assert_eq!(ExportFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn repeated_composes_hit_the_cache() {
        let scene = snapshot(solid_uri(10, 10, 9, 9, 9), 10, 10);
        let compositor = compositor();

        let _ = compositor.compose(&scene).expect("first");
        let _ = compositor.compose(&scene).expect("second");

        let stats = compositor.cache_stats();
        assert_eq!(stats.misses, 1);
        assert!(stats.hits >= 1);
    }
}
