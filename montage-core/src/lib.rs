//! # Montage Core
//!
//! Editor logic for layered image compositing: a mutable scene of
//! image/text/sticker layers over a switchable background, pointer-driven
//! layer transforms with canvas-bound clamping, and an independent
//! freehand drawing raster. Rendering lives in `montage-render`; this
//! crate owns state and geometry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Editor                    │
//! ├──────────────────────┬──────────────────────┤
//! │  Layer Store         │  Tool State          │
//! │  - ordered layers    │  - move / pen /      │
//! │  - active selection  │    brush             │
//! ├──────────────────────┼──────────────────────┤
//! │  Transform Control   │  Drawing Surface     │
//! │  - drag sessions     │  - stroke capture    │
//! │  - position clamp    │  - raster buffer     │
//! ├──────────────────────┴──────────────────────┤
//! │  Background Selector (circular, non-empty)  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod color;
pub mod controller;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layer;
pub mod store;
pub mod tool;

pub use background::{BackgroundSelector, Direction};
pub use controller::DragSession;
pub use drawing::DrawingSurface;
pub use editor::{
    DecodedImage, Editor, ImageDecoder, SceneDocument, SceneSnapshot, TransformPatch,
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH,
};
pub use error::{EditorError, EditorResult};
pub use event::{PointerEvent, PointerPhase};
pub use geometry::{clamp_position, Point, Rect, Size};
pub use layer::{Layer, LayerId, LayerKind, StickerKind};
pub use store::LayerStore;
pub use tool::{BrushSettings, Tool};

/// Montage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
