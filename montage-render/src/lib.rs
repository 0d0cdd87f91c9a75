//! # Montage Render
//!
//! CPU compositor for montage scenes: decodes layer sources, rasterizes
//! text and sticker artwork, and flattens everything into exportable
//! PNG or JPEG bytes with tiny-skia.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐   ┌─────────────────────────────┐   ┌──────────────┐
//! │   Scene    │──▶│         Compositor          │──▶│  PNG / JPEG  │
//! │  snapshot  │   ├─────────┬─────────┬─────────┤   │    bytes     │
//! └────────────┘   │ images  │  text   │ sticker │   └──────────────┘
//!                  │ (cache) │ (fonts) │ (paths) │
//!                  └─────────┴─────────┴─────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod compose;
pub mod error;
pub mod image;
pub mod sticker;
pub mod text;

pub use cache::{CacheStats, ImageCache, ImageCacheConfig};
pub use compose::{ComposeConfig, Compositor, ExportFormat};
pub use error::{RenderError, RenderResult};
pub use image::{decode_data_uri, encode_data_uri, ImageData, ImageFormat, UploadDecoder};
pub use text::FontLibrary;
