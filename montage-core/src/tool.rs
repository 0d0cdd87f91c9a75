//! Tool selection and brush settings.

use serde::{Deserialize, Serialize};

/// Stroke width bounds for the drawing tools.
pub const STROKE_WIDTH_MIN: f32 = 1.0;
/// See [`STROKE_WIDTH_MIN`].
pub const STROKE_WIDTH_MAX: f32 = 50.0;

/// Default stroke width.
pub const DEFAULT_STROKE_WIDTH: f32 = 5.0;

/// Default stroke color (hex).
pub const DEFAULT_STROKE_COLOR: &str = "#FFFFFF";

/// The brush tool paints wider than the configured width to feel softer.
pub const BRUSH_WIDTH_FACTOR: f32 = 1.5;

/// The interaction tool currently driving pointer input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Select and drag layers.
    #[default]
    Move,
    /// Freehand drawing at the configured width.
    Pen,
    /// Freehand drawing at 1.5x the configured width.
    Brush,
}

impl Tool {
    /// Whether this tool captures strokes instead of layer drags.
    #[must_use]
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Pen | Self::Brush)
    }

    /// Effective stroke width for a configured base width.
    #[must_use]
    pub fn stroke_width(self, base: f32) -> f32 {
        match self {
            Self::Brush => base * BRUSH_WIDTH_FACTOR,
            Self::Move | Self::Pen => base,
        }
    }
}

/// Color and width shared by the pen and brush tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    /// Stroke color as hex.
    pub color: String,
    /// Configured stroke width in pixels, [1, 50].
    pub size: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR.to_string(),
            size: DEFAULT_STROKE_WIDTH,
        }
    }
}
