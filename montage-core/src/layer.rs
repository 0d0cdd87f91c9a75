//! Layers - the transformable building blocks of a composition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{rotate_about, Point, Rect, Size};

/// Default top-left position for newly created layers.
pub const DEFAULT_POSITION: Point = Point { x: 50.0, y: 50.0 };

/// Base width every uploaded image is normalized to; height follows the
/// natural aspect ratio.
pub const IMAGE_BASE_WIDTH: f32 = 150.0;

/// Base dimensions of a new text layer.
pub const TEXT_BASE_SIZE: Size = Size {
    width: 200.0,
    height: 50.0,
};

/// Placeholder content for a new text layer.
pub const DEFAULT_TEXT: &str = "Edit Me";

/// Default text color (hex).
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// Default text font family.
pub const DEFAULT_FONT_FAMILY: &str = "Impact";

/// Font families offered by the editor UI.
pub const FONT_FAMILIES: &[&str] = &[
    "Impact",
    "Anton",
    "Bangers",
    "Lobster",
    "Arial",
    "Comic Sans MS",
];

/// Text renders at this size (in canvas pixels) before layer scaling.
pub const TEXT_FONT_SIZE: f32 = 32.0;

/// Minimum layer scale.
pub const SCALE_MIN: f32 = 0.1;

/// Maximum layer scale.
pub const SCALE_MAX: f32 = 5.0;

/// Rotation bounds in degrees.
pub const ROTATION_MIN: f32 = -180.0;
/// See [`ROTATION_MIN`].
pub const ROTATION_MAX: f32 = 180.0;

/// Unique identifier for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Create a new unique layer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The built-in sticker shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StickerKind {
    /// Pixel sunglasses.
    Glasses,
    /// A top hat.
    TopHat,
    /// A handlebar mustache.
    Mustache,
    /// A lit cigar.
    Cigar,
    /// A dollar-sign chain.
    Bling,
    /// A royal crown.
    Crown,
}

impl StickerKind {
    /// Every sticker kind, in UI order.
    pub const ALL: [Self; 6] = [
        Self::Glasses,
        Self::TopHat,
        Self::Mustache,
        Self::Cigar,
        Self::Bling,
        Self::Crown,
    ];

    /// Base (unscaled) dimensions of the sticker art.
    #[must_use]
    pub fn base_size(self) -> Size {
        match self {
            Self::Glasses => Size::new(80.0, 30.0),
            Self::TopHat => Size::new(80.0, 70.0),
            Self::Mustache => Size::new(80.0, 24.0),
            Self::Cigar => Size::new(60.0, 18.0),
            Self::Bling => Size::new(60.0, 60.0),
            Self::Crown => Size::new(70.0, 50.0),
        }
    }

    /// Human-readable name for pickers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Glasses => "Glasses",
            Self::TopHat => "Top Hat",
            Self::Mustache => "Mustache",
            Self::Cigar => "Cigar",
            Self::Bling => "Bling",
            Self::Crown => "Crown",
        }
    }
}

/// The kind-specific payload a layer carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LayerKind {
    /// A raster image, referenced as a data URI.
    Image {
        /// Image source as a data URI.
        src: String,
    },

    /// An editable text label.
    Text {
        /// Text content.
        content: String,
        /// Text color as hex.
        color: String,
        /// Font family name.
        font_family: String,
    },

    /// A built-in vector sticker.
    Sticker {
        /// Which sticker to draw.
        kind: StickerKind,
    },
}

impl LayerKind {
    /// Short tag for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Sticker { .. } => "sticker",
        }
    }
}

/// A positioned, transformable element of the composition.
///
/// `width`/`height` are the base dimensions fixed at creation; the rendered
/// bounding box is `position` + `width * scale` x `height * scale`.
/// Rotation pivots at the rendered box center and never affects clamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Unique identifier, stable for the layer's lifetime.
    pub id: LayerId,
    /// Kind-specific content.
    pub kind: LayerKind,
    /// Top-left offset in canvas pixel space.
    pub position: Point,
    /// Multiplier applied to the base dimensions.
    pub scale: f32,
    /// Rotation in degrees, [-180, 180].
    pub rotation: f32,
    /// Base width in canvas pixels.
    pub width: f32,
    /// Base height in canvas pixels.
    pub height: f32,
}

impl Layer {
    /// Create a layer with the given content and base size, using the
    /// creation defaults for the transform.
    #[must_use]
    pub fn new(kind: LayerKind, base: Size) -> Self {
        Self {
            id: LayerId::new(),
            kind,
            position: DEFAULT_POSITION,
            scale: 1.0,
            rotation: 0.0,
            width: base.width,
            height: base.height,
        }
    }

    /// Create an image layer from a data URI and the decoded natural
    /// dimensions. Base width is fixed; height follows the aspect ratio.
    #[must_use]
    pub fn image(src: String, natural_width: u32, natural_height: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let height = if natural_width == 0 {
            IMAGE_BASE_WIDTH
        } else {
            IMAGE_BASE_WIDTH * natural_height as f32 / natural_width as f32
        };
        Self::new(
            LayerKind::Image { src },
            Size::new(IMAGE_BASE_WIDTH, height),
        )
    }

    /// Create a text layer with the placeholder content and default style.
    #[must_use]
    pub fn text() -> Self {
        Self::new(
            LayerKind::Text {
                content: DEFAULT_TEXT.to_string(),
                color: DEFAULT_TEXT_COLOR.to_string(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
            },
            TEXT_BASE_SIZE,
        )
    }

    /// Create a sticker layer at the sticker's base size.
    #[must_use]
    pub fn sticker(kind: StickerKind) -> Self {
        Self::new(LayerKind::Sticker { kind }, kind.base_size())
    }

    /// Base (unscaled) dimensions.
    #[must_use]
    pub fn base_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Dimensions after applying the current scale.
    #[must_use]
    pub fn rendered_size(&self) -> Size {
        self.base_size().scaled(self.scale)
    }

    /// Axis-aligned rendered bounding box (ignores rotation).
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.position, self.rendered_size())
    }

    /// Center of the rendered box; the rotation pivot.
    #[must_use]
    pub fn center(&self) -> Point {
        self.bounding_box().center()
    }

    /// Check whether a canvas-space point hits this layer.
    ///
    /// Hit testing honors rotation: the point is rotated back around the
    /// layer center before the box test, so a rotated layer is grabbed
    /// where it is drawn.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let local = if self.rotation == 0.0 {
            point
        } else {
            rotate_about(point, self.center(), -self.rotation)
        };
        self.bounding_box().contains(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_layer_normalizes_to_base_width() {
        let layer = Layer::image("data:image/png;base64,".to_string(), 300, 200);
        assert!((layer.width - 150.0).abs() < f32::EPSILON);
        assert!((layer.height - 100.0).abs() < f32::EPSILON);
        assert_eq!(layer.position, DEFAULT_POSITION);
        assert!((layer.scale - 1.0).abs() < f32::EPSILON);
        assert!((layer.rotation - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn text_layer_defaults() {
        let layer = Layer::text();
        match &layer.kind {
            LayerKind::Text {
                content,
                color,
                font_family,
            } => {
                assert_eq!(content, "Edit Me");
                assert_eq!(color, "#FFFFFF");
                assert_eq!(font_family, "Impact");
            }
            other => panic!("expected text layer, got {other:?}"),
        }
        assert!((layer.width - 200.0).abs() < f32::EPSILON);
        assert!((layer.height - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_font_is_in_the_offered_list() {
        assert!(FONT_FAMILIES.contains(&DEFAULT_FONT_FAMILY));
    }

    #[test]
    fn rendered_size_follows_scale() {
        let mut layer = Layer::image(String::new(), 300, 200);
        layer.scale = 2.0;
        let rendered = layer.rendered_size();
        assert!((rendered.width - 300.0).abs() < f32::EPSILON);
        assert!((rendered.height - 200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn contains_point_ignores_far_points() {
        let layer = Layer::sticker(StickerKind::Glasses);
        assert!(layer.contains_point(Point::new(60.0, 60.0)));
        assert!(!layer.contains_point(Point::new(200.0, 200.0)));
    }

    #[test]
    fn contains_point_honors_rotation() {
        // 80x30 sticker at (50,50), rotated 90 degrees about its center
        // (90, 65): the drawn box is now tall, roughly x in [75,105],
        // y in [25,105].
        let mut layer = Layer::sticker(StickerKind::Glasses);
        layer.rotation = 90.0;

        assert!(layer.contains_point(Point::new(90.0, 30.0)));
        // Inside the unrotated box but outside the drawn one.
        assert!(!layer.contains_point(Point::new(55.0, 60.0)));
    }

    #[test]
    fn sticker_serde_uses_kebab_case() {
        let json = serde_json::to_string(&StickerKind::TopHat).expect("serialize");
        assert_eq!(json, "\"top-hat\"");
    }

    #[test]
    fn layer_kind_serde_is_tagged() {
        let layer = Layer::text();
        let json = serde_json::to_value(&layer).expect("serialize");
        assert_eq!(json["kind"]["type"], "text");
        assert_eq!(json["kind"]["data"]["content"], "Edit Me");
    }
}
