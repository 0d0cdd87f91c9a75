//! Drag session for the transform controller.
//!
//! A session captures the pointer offset at press time and turns each
//! subsequent pointer position into a clamped layer position. Every move
//! writes live state; there is no staging or rollback on release.

use crate::geometry::{clamp_position, Point, Size};
use crate::layer::{Layer, LayerId};

/// State of one in-progress layer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    layer_id: LayerId,
    offset: Point,
}

impl DragSession {
    /// Begin a drag of `layer` from pointer position `pointer`, recording
    /// the grab offset so the layer does not jump under the cursor.
    #[must_use]
    pub fn begin(layer: &Layer, pointer: Point) -> Self {
        Self {
            layer_id: layer.id,
            offset: pointer - layer.position,
        }
    }

    /// The layer this session is dragging.
    #[must_use]
    pub fn layer_id(&self) -> LayerId {
        self.layer_id
    }

    /// Raw (unclamped) target position for a pointer position.
    #[must_use]
    pub fn target_position(&self, pointer: Point) -> Point {
        pointer - self.offset
    }

    /// Clamped target position for a pointer position, given the layer's
    /// rendered size and the canvas size.
    #[must_use]
    pub fn clamped_position(&self, pointer: Point, rendered: Size, canvas: Size) -> Point {
        clamp_position(self.target_position(pointer), rendered, canvas)
    }
}
