//! Image decoding and data-URI handling.
//!
//! Scene layers and backgrounds carry their pixels as base64 data URIs, so
//! the same scene document can be rendered here and echoed back to clients
//! without a separate asset store.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageEncoder;
use montage_core::{DecodedImage, EditorError, EditorResult, ImageDecoder};
use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};

/// Encoded image formats recognised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
    /// GIF image (first frame only).
    Gif,
    /// WebP image.
    WebP,
    /// Unrecognised format.
    Unknown,
}

impl ImageFormat {
    /// Detect the format from leading magic bytes.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Self::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if bytes.starts_with(b"GIF8") {
            Self::Gif
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// Detect the format from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// MIME type for the format.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Decoded image pixels in straight (non-premultiplied) RGBA order.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl ImageData {
    /// Decode an image from its encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a decodable image.
    pub fn load_from_bytes(bytes: &[u8]) -> RenderResult<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RenderError::Resource(format!("image decode failed: {e}")))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            data: rgba.into_raw(),
        })
    }

    /// Decode an image from a base64 data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is malformed or the payload does not
    /// decode to an image.
    pub fn load_from_data_uri(uri: &str) -> RenderResult<Self> {
        let bytes = decode_data_uri(uri)?;
        Self::load_from_bytes(&bytes)
    }

    /// Create a uniformly colored image.
    #[must_use]
    pub fn solid_color(width: u32, height: u32, r: u8, g: u8, b: u8, a: u8) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[r, g, b, a]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert to a premultiplied pixmap ready for compositing.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or the pixel buffer does
    /// not match them.
    pub fn to_pixmap(&self) -> RenderResult<Pixmap> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(RenderError::Resource(format!(
                "pixel buffer is {} bytes, expected {expected}",
                self.data.len()
            )));
        }
        let mut pixmap = Pixmap::new(self.width, self.height).ok_or_else(|| {
            RenderError::Resource(format!(
                "cannot allocate a {}x{} pixmap",
                self.width, self.height
            ))
        })?;
        pixmap.data_mut().copy_from_slice(&self.data);
        premultiply_rgba_in_place(pixmap.data_mut());
        Ok(pixmap)
    }

    /// Encode to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(
                &self.data,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }

    /// Encode to a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_data_uri(&self) -> RenderResult<String> {
        let png = self.encode_png()?;
        Ok(encode_data_uri(ImageFormat::Png.mime_type(), &png))
    }
}

/// Extract the binary payload of a base64 data URI.
///
/// # Errors
///
/// Returns an error if the URI is not a base64 data URI.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("malformed data URI: missing payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(RenderError::Resource(
            "only base64 data URIs are supported".to_string(),
        ));
    }
    BASE64
        .decode(payload)
        .map_err(|e| RenderError::Resource(format!("invalid base64 payload: {e}")))
}

/// Wrap encoded bytes in a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Premultiply straight RGBA bytes in place.
///
/// Matches the fixed-point rounding tiny-skia uses internally.
#[allow(clippy::cast_possible_truncation)]
fn premultiply_rgba_in_place(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        if alpha == 255 {
            continue;
        }
        for channel in &mut pixel[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
}

/// Decodes uploaded image files on behalf of the editor core.
///
/// The original encoded bytes are preserved in the resulting data URI so
/// re-exports do not recompress the source; only the dimensions come from
/// the decoded pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadDecoder;

impl ImageDecoder for UploadDecoder {
    fn decode_upload(&self, bytes: &[u8]) -> EditorResult<DecodedImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| EditorError::InvalidInput(format!("unreadable image upload: {e}")))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let format = ImageFormat::from_magic_bytes(bytes);
        Ok(DecodedImage {
            src: encode_data_uri(format.mime_type(), bytes),
            width,
            height,
        })
    }
}
