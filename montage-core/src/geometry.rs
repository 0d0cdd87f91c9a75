//! Canvas-space geometry: points, sizes, and the position clamp.
//!
//! The clamp is deliberately a free function of plain values so it can be
//! tested without an editor instance. Clamping always uses the unrotated
//! bounding box; rotated layers may visually overflow the canvas edge.

use serde::{Deserialize, Serialize};

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Pixels from the left edge.
    pub x: f32,
    /// Pixels from the top edge.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A width/height pair in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// This size with both axes multiplied by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// An axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Extent from the origin.
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from a top-left corner and a size.
    #[must_use]
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Geometric center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Check whether a point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.size.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.size.height
    }
}

/// Clamp one axis so `[value, value + rendered]` stays inside
/// `[0, canvas]`.
///
/// When the rendered extent exceeds the canvas the range is empty and the
/// axis pins to `0` (the min-then-max order makes that fall out naturally).
#[must_use]
pub fn clamp_axis(value: f32, rendered: f32, canvas: f32) -> f32 {
    value.min(canvas - rendered).max(0.0)
}

/// Clamp a candidate top-left position so the rendered bounding box stays
/// within the canvas rectangle on both axes.
#[must_use]
pub fn clamp_position(raw: Point, rendered: Size, canvas: Size) -> Point {
    Point::new(
        clamp_axis(raw.x, rendered.width, canvas.width),
        clamp_axis(raw.y, rendered.height, canvas.height),
    )
}

/// Rotate `point` around `center` by `degrees` (clockwise, matching screen
/// coordinates where y grows downward).
#[must_use]
pub fn rotate_about(point: Point, center: Point, degrees: f32) -> Point {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}
