//! Pointer input events.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Lifecycle phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Pointer pressed.
    Down,
    /// Pointer moved while pressed.
    Move,
    /// Pointer released.
    Up,
    /// Interaction aborted (pointer left the canvas, OS cancel).
    Cancel,
}

/// A single pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Interaction phase.
    pub phase: PointerPhase,
    /// Pointer position in canvas pixel space.
    pub position: Point,
}

impl PointerEvent {
    /// Create an event from a phase and coordinates.
    #[must_use]
    pub fn new(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            phase,
            position: Point::new(x, y),
        }
    }

    /// Pointer-down at the given coordinates.
    #[must_use]
    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Down, x, y)
    }

    /// Pointer-move at the given coordinates.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Move, x, y)
    }

    /// Pointer-up at the given coordinates.
    #[must_use]
    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Up, x, y)
    }

    /// Cancelled interaction at the given coordinates.
    #[must_use]
    pub fn cancel(x: f32, y: f32) -> Self {
        Self::new(PointerPhase::Cancel, x, y)
    }
}
