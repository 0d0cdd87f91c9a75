//! Freehand drawing surface.
//!
//! A canvas-aligned raster that accumulates pen/brush strokes. It is not a
//! layer: it has no transform, strokes are not individually editable, and
//! only a reset (or background switch) clears it.

use tiny_skia::{
    LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform as SkiaTransform,
};

use crate::geometry::Point;

/// Stroke capture state.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StrokeState {
    Idle,
    Drawing {
        last: Point,
        color: [u8; 4],
        width: f32,
    },
}

/// Persistent raster buffer for freehand strokes.
///
/// State machine: `idle -> drawing -> idle`. A pointer-down starts a path,
/// every pointer-move strokes one segment from the last recorded point,
/// and pointer-up/cancel returns to idle. Painted pixels stay until
/// [`DrawingSurface::clear`].
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    pixmap: Pixmap,
    state: StrokeState,
    dirty: bool,
}

impl DrawingSurface {
    /// Create a transparent surface with the given pixel dimensions.
    /// Returns `None` if either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            state: StrokeState::Idle,
            dirty: false,
        })
    }

    /// Begin a stroke at `at` with the effective color and width. The
    /// settings are fixed for the stroke's duration. No pixels are painted
    /// until the first [`extend_stroke`](Self::extend_stroke).
    pub fn begin_stroke(&mut self, at: Point, color: [u8; 4], width: f32) {
        self.state = StrokeState::Drawing {
            last: at,
            color,
            width,
        };
    }

    /// Append a segment from the last recorded point to `to`. A no-op
    /// while idle (a move event without a preceding down).
    pub fn extend_stroke(&mut self, to: Point) {
        let StrokeState::Drawing { last, color, width } = self.state else {
            return;
        };
        self.stroke_segment(last, to, color, width);
        self.state = StrokeState::Drawing {
            last: to,
            color,
            width,
        };
    }

    /// Finish the current stroke. The painted pixels remain.
    pub fn end_stroke(&mut self) {
        self.state = StrokeState::Idle;
    }

    /// Whether a stroke is currently being captured.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Whether any stroke has painted pixels since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.dirty
    }

    /// Erase everything and return to idle.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.state = StrokeState::Idle;
        self.dirty = false;
    }

    /// The underlying raster (premultiplied RGBA).
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Surface width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Surface height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn stroke_segment(&mut self, from: Point, to: Point, color: [u8; 4], width: f32) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        let Some(path) = builder.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        self.pixmap
            .stroke_path(&path, &paint, &stroke, SkiaTransform::identity(), None);
        self.dirty = true;
    }
}
