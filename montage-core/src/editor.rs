//! The editor facade: one self-contained composition session.
//!
//! Owns the layer store, drawing surface, background selector, tool state,
//! and the in-progress drag, and routes pointer input to whichever
//! interaction model the current tool selects. Multiple editors coexist
//! independently; nothing here is global.

use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::background::{BackgroundSelector, Direction};
use crate::color;
use crate::controller::DragSession;
use crate::drawing::DrawingSurface;
use crate::error::{EditorError, EditorResult};
use crate::event::{PointerEvent, PointerPhase};
use crate::geometry::{clamp_position, Point, Size};
use crate::layer::{
    Layer, LayerId, LayerKind, StickerKind, ROTATION_MAX, ROTATION_MIN, SCALE_MAX, SCALE_MIN,
};
use crate::store::LayerStore;
use crate::tool::{BrushSettings, Tool, STROKE_WIDTH_MAX, STROKE_WIDTH_MIN};

/// Default canvas pixel width (16:9).
pub const DEFAULT_CANVAS_WIDTH: u32 = 1280;

/// Default canvas pixel height.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 720;

/// Decodes uploaded bytes into a displayable image reference.
///
/// Implemented by the renderer crate; the editor only needs the natural
/// dimensions and a data URI it can hand back to the compositor later.
pub trait ImageDecoder {
    /// Decode uploaded file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidInput`] if the bytes are not a
    /// supported image format.
    fn decode_upload(&self, bytes: &[u8]) -> EditorResult<DecodedImage>;
}

/// A successfully decoded upload.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Displayable reference (data URI).
    pub src: String,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
}

/// Partial transform update for one layer. Absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TransformPatch {
    /// New top-left position (clamped to the canvas).
    pub position: Option<Point>,
    /// New scale (clamped to [0.1, 5.0]).
    pub scale: Option<f32>,
    /// New rotation in degrees (clamped to [-180, 180]).
    pub rotation: Option<f32>,
}

/// Owned scene state handed to the compositor.
///
/// Built by [`Editor::export_snapshot`]; the editor stays interactive
/// while rasterization works on this copy.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    /// Current background reference (data URI).
    pub background: String,
    /// Layers in stacking order, bottom first.
    pub layers: Vec<Layer>,
    /// Drawing raster, present only if any stroke painted pixels.
    pub drawing: Option<Pixmap>,
    /// Canvas pixel width.
    pub canvas_width: u32,
    /// Canvas pixel height.
    pub canvas_height: u32,
}

impl SceneSnapshot {
    /// Canvas dimensions as a float size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width as f32, self.canvas_height as f32)
    }
}

/// Serializable view of the editor state for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDocument {
    /// Canvas pixel width.
    pub canvas_width: u32,
    /// Canvas pixel height.
    pub canvas_height: u32,
    /// Current tool.
    pub tool: Tool,
    /// Current brush settings.
    pub brush: BrushSettings,
    /// Index of the current background.
    pub background_index: usize,
    /// Number of available backgrounds.
    pub background_count: usize,
    /// Active layer id, if any.
    pub active_layer: Option<LayerId>,
    /// Whether the drawing surface holds any strokes.
    pub has_drawing: bool,
    /// Layers in stacking order, bottom first.
    pub layers: Vec<Layer>,
}

/// A layered compositing editor session.
#[derive(Debug, Clone)]
pub struct Editor {
    store: LayerStore,
    drawing: DrawingSurface,
    backgrounds: BackgroundSelector,
    tool: Tool,
    brush: BrushSettings,
    drag: Option<DragSession>,
    canvas_width: u32,
    canvas_height: u32,
}

impl Editor {
    /// Create an editor over the provider-supplied background list with
    /// the given canvas pixel dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EmptyBackgroundList`] for an empty list and
    /// [`EditorError::InvalidInput`] for a zero-sized canvas.
    pub fn new(
        backgrounds: Vec<String>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> EditorResult<Self> {
        let backgrounds = BackgroundSelector::new(backgrounds)?;
        let drawing = DrawingSurface::new(canvas_width, canvas_height).ok_or_else(|| {
            EditorError::InvalidInput(format!(
                "canvas dimensions must be non-zero, got {canvas_width}x{canvas_height}"
            ))
        })?;
        Ok(Self {
            store: LayerStore::new(),
            drawing,
            backgrounds,
            tool: Tool::default(),
            brush: BrushSettings::default(),
            drag: None,
            canvas_width,
            canvas_height,
        })
    }

    /// Canvas dimensions as a float size.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width as f32, self.canvas_height as f32)
    }

    // ----- layer creation ---------------------------------------------

    /// Decode an uploaded file and add it as a new image layer.
    ///
    /// The layer is normalized to the base width, becomes active, and the
    /// tool switches to `move` so it can be positioned immediately.
    ///
    /// # Errors
    ///
    /// Propagates the decoder's [`EditorError::InvalidInput`] for
    /// non-image data; the scene is unchanged on failure.
    pub fn upload_image(
        &mut self,
        bytes: &[u8],
        decoder: &dyn ImageDecoder,
    ) -> EditorResult<LayerId> {
        let decoded = decoder.decode_upload(bytes)?;
        let layer = Layer::image(decoded.src, decoded.width, decoded.height);
        Ok(self.finish_add(layer))
    }

    /// Swap the pixels of an existing image layer, keeping its transform
    /// and base dimensions (used after AI background removal).
    ///
    /// Returns `false` for a stale id.
    ///
    /// # Errors
    ///
    /// [`EditorError::WrongLayerKind`] if the target is not an image
    /// layer; decoder errors propagate as for [`Editor::upload_image`].
    pub fn replace_layer_image(
        &mut self,
        id: LayerId,
        bytes: &[u8],
        decoder: &dyn ImageDecoder,
    ) -> EditorResult<bool> {
        let Some(layer) = self.store.get(id) else {
            return Ok(false);
        };
        if !matches!(layer.kind, LayerKind::Image { .. }) {
            return Err(EditorError::WrongLayerKind(id.to_string(), "image"));
        }
        let decoded = decoder.decode_upload(bytes)?;
        Ok(self.store.update(id, |layer| {
            if let LayerKind::Image { src } = &mut layer.kind {
                *src = decoded.src;
            }
        }))
    }

    /// Add a text layer with the placeholder content and default style.
    pub fn add_text_layer(&mut self) -> LayerId {
        self.finish_add(Layer::text())
    }

    /// Add a sticker layer at the sticker's base size.
    pub fn add_sticker_layer(&mut self, kind: StickerKind) -> LayerId {
        self.finish_add(Layer::sticker(kind))
    }

    fn finish_add(&mut self, layer: Layer) -> LayerId {
        tracing::debug!(kind = layer.kind.name(), id = %layer.id, "layer added");
        let id = self.store.add(layer);
        // New layers are placed with the move tool; selection survives
        // because entering move never clears it.
        self.tool = Tool::Move;
        self.drag = None;
        id
    }

    // ----- selection and deletion -------------------------------------

    /// Make `id` the active layer. Only the move tool permits selection;
    /// in a drawing tool (or for a stale id) this is a no-op returning
    /// `false`.
    pub fn select_layer(&mut self, id: LayerId) -> bool {
        if self.tool != Tool::Move {
            return false;
        }
        self.store.set_active(Some(id))
    }

    /// Clear the active selection.
    pub fn deselect(&mut self) {
        self.store.set_active(None);
    }

    /// Delete a layer by id. Returns `false` for a stale id.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed {
            tracing::debug!(id = %id, "layer deleted");
        }
        removed
    }

    /// Delete the active layer, if any, and clear the selection.
    pub fn delete_active_layer(&mut self) -> Option<LayerId> {
        let id = self.store.active_id()?;
        self.store.remove(id);
        Some(id)
    }

    // ----- transform and content updates ------------------------------

    /// Merge a transform patch into the layer matching `id`, clamping
    /// scale and rotation to their bounds and re-clamping the position so
    /// the rendered box stays inside the canvas (also after a scale-up at
    /// the edge). Returns `false` for a stale id.
    pub fn update_layer_transform(&mut self, id: LayerId, patch: TransformPatch) -> bool {
        let canvas = self.canvas_size();
        self.store.update(id, |layer| {
            if let Some(scale) = patch.scale {
                layer.scale = scale.clamp(SCALE_MIN, SCALE_MAX);
            }
            if let Some(rotation) = patch.rotation {
                layer.rotation = rotation.clamp(ROTATION_MIN, ROTATION_MAX);
            }
            let raw = patch.position.unwrap_or(layer.position);
            layer.position = clamp_position(raw, layer.rendered_size(), canvas);
        })
    }

    /// Replace the content of a text layer. Returns `false` for a stale
    /// id.
    ///
    /// # Errors
    ///
    /// [`EditorError::WrongLayerKind`] if the target is not a text layer.
    pub fn set_text_content(&mut self, id: LayerId, content: &str) -> EditorResult<bool> {
        let Some(layer) = self.store.get(id) else {
            return Ok(false);
        };
        if !matches!(layer.kind, LayerKind::Text { .. }) {
            return Err(EditorError::WrongLayerKind(id.to_string(), "text"));
        }
        let content = content.to_string();
        Ok(self.store.update(id, |layer| {
            if let LayerKind::Text { content: current, .. } = &mut layer.kind {
                *current = content;
            }
        }))
    }

    /// Restyle a text layer. Absent fields are left alone. Returns
    /// `false` for a stale id.
    ///
    /// # Errors
    ///
    /// [`EditorError::WrongLayerKind`] for non-text targets;
    /// [`EditorError::InvalidInput`] for a malformed hex color.
    pub fn set_text_style(
        &mut self,
        id: LayerId,
        color: Option<&str>,
        font_family: Option<&str>,
    ) -> EditorResult<bool> {
        let Some(layer) = self.store.get(id) else {
            return Ok(false);
        };
        if !matches!(layer.kind, LayerKind::Text { .. }) {
            return Err(EditorError::WrongLayerKind(id.to_string(), "text"));
        }
        if let Some(color) = color {
            if crate::color::parse_hex(color).is_none() {
                return Err(EditorError::InvalidInput(format!(
                    "malformed hex color: {color}"
                )));
            }
        }
        let color = color.map(str::to_string);
        let font_family = font_family.map(str::to_string);
        Ok(self.store.update(id, |layer| {
            if let LayerKind::Text {
                color: current_color,
                font_family: current_font,
                ..
            } = &mut layer.kind
            {
                if let Some(color) = color {
                    *current_color = color;
                }
                if let Some(font) = font_family {
                    *current_font = font;
                }
            }
        }))
    }

    // ----- tool and brush ---------------------------------------------

    /// Switch the interaction tool. Always lands between interactions
    /// (any in-progress stroke or drag is finished first); entering a
    /// drawing tool clears the active selection.
    pub fn set_tool(&mut self, tool: Tool) {
        self.drawing.end_stroke();
        self.drag = None;
        self.tool = tool;
        if tool != Tool::Move {
            self.store.set_active(None);
        }
    }

    /// Update the brush color and/or width. Width clamps to [1, 50].
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidInput`] for a malformed hex color; nothing
    /// is changed on failure.
    pub fn set_brush(&mut self, color: Option<&str>, size: Option<f32>) -> EditorResult<()> {
        if let Some(color) = color {
            if crate::color::parse_hex(color).is_none() {
                return Err(EditorError::InvalidInput(format!(
                    "malformed hex color: {color}"
                )));
            }
            self.brush.color = color.to_string();
        }
        if let Some(size) = size {
            self.brush.size = size.clamp(STROKE_WIDTH_MIN, STROKE_WIDTH_MAX);
        }
        Ok(())
    }

    // ----- pointer dispatch -------------------------------------------

    /// Route a pointer event to the interaction model the current tool
    /// selects: layer drag for `move`, stroke capture for `pen`/`brush`.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.tool.is_drawing() {
            self.handle_drawing_pointer(event);
        } else {
            self.handle_move_pointer(event);
        }
    }

    fn handle_move_pointer(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Down => match self.store.layer_at(event.position) {
                Some(id) => {
                    self.store.set_active(Some(id));
                    if let Some(layer) = self.store.get(id) {
                        self.drag = Some(DragSession::begin(layer, event.position));
                    }
                }
                None => {
                    // Clicking empty canvas clears the selection.
                    self.store.set_active(None);
                    self.drag = None;
                }
            },
            PointerPhase::Move => {
                let Some(session) = self.drag else {
                    return;
                };
                let canvas = self.canvas_size();
                let Some(layer) = self.store.get(session.layer_id()) else {
                    self.drag = None;
                    return;
                };
                let position =
                    session.clamped_position(event.position, layer.rendered_size(), canvas);
                self.store
                    .update(session.layer_id(), |layer| layer.position = position);
            }
            PointerPhase::Up | PointerPhase::Cancel => self.drag = None,
        }
    }

    fn handle_drawing_pointer(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Down => {
                // Brush color was validated on the way in; fall back to
                // white rather than dropping the stroke.
                let color = color::parse_hex(&self.brush.color).unwrap_or([255, 255, 255, 255]);
                let width = self.tool.stroke_width(self.brush.size);
                self.drawing.begin_stroke(event.position, color, width);
            }
            PointerPhase::Move => self.drawing.extend_stroke(event.position),
            PointerPhase::Up | PointerPhase::Cancel => self.drawing.end_stroke(),
        }
    }

    // ----- background and reset ---------------------------------------

    /// Switch to the previous/next background. Discards the current
    /// composition (soft reset) and returns the new background index.
    pub fn cycle_background(&mut self, direction: Direction) -> usize {
        let index = self.backgrounds.cycle(direction);
        tracing::debug!(index, "background switched, scene reset");
        self.clear_scene();
        index
    }

    /// Clear all layers, the selection, and the drawing surface. A hard
    /// reset also returns the background index to 0. The tool survives.
    pub fn reset(&mut self, hard: bool) {
        if hard {
            self.backgrounds.reset_index();
        }
        self.clear_scene();
        tracing::debug!(hard, "editor reset");
    }

    fn clear_scene(&mut self) {
        self.store.clear();
        self.drawing.clear();
        self.drag = None;
    }

    // ----- export -----------------------------------------------------

    /// Clear the selection (so selection affordances are never captured)
    /// and take an owned snapshot for the compositor.
    pub fn export_snapshot(&mut self) -> SceneSnapshot {
        self.store.set_active(None);
        SceneSnapshot {
            background: self.backgrounds.current().to_string(),
            layers: self.store.iter().cloned().collect(),
            drawing: if self.drawing.is_empty() {
                None
            } else {
                Some(self.drawing.pixmap().clone())
            },
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
        }
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn document(&self) -> SceneDocument {
        SceneDocument {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            tool: self.tool,
            brush: self.brush.clone(),
            background_index: self.backgrounds.index(),
            background_count: self.backgrounds.len(),
            active_layer: self.store.active_id(),
            has_drawing: !self.drawing.is_empty(),
            layers: self.store.iter().cloned().collect(),
        }
    }

    // ----- accessors --------------------------------------------------

    /// The current tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// The current brush settings.
    #[must_use]
    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    /// The active layer id, if any.
    #[must_use]
    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.store.active_id()
    }

    /// A layer by id.
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.store.get(id)
    }

    /// Layers in stacking order, bottom first.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.store.iter()
    }

    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.store.len()
    }

    /// The drawing surface.
    #[must_use]
    pub fn drawing(&self) -> &DrawingSurface {
        &self.drawing
    }

    /// Current background reference.
    #[must_use]
    pub fn current_background(&self) -> &str {
        self.backgrounds.current()
    }

    /// Current background index.
    #[must_use]
    pub fn background_index(&self) -> usize {
        self.backgrounds.index()
    }

    /// Number of available backgrounds.
    #[must_use]
    pub fn background_count(&self) -> usize {
        self.backgrounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decoder stub that reports fixed natural dimensions.
    struct StubDecoder {
        width: u32,
        height: u32,
    }

    impl ImageDecoder for StubDecoder {
        fn decode_upload(&self, _bytes: &[u8]) -> EditorResult<DecodedImage> {
            Ok(DecodedImage {
                src: "data:image/png;base64,stub".to_string(),
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Decoder stub that rejects everything.
    struct RejectingDecoder;

    impl ImageDecoder for RejectingDecoder {
        fn decode_upload(&self, _bytes: &[u8]) -> EditorResult<DecodedImage> {
            Err(EditorError::InvalidInput("not an image".to_string()))
        }
    }

    fn editor() -> Editor {
        Editor::new(vec!["bg-0".to_string(), "bg-1".to_string()], 800, 600)
            .expect("valid editor config")
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let err = Editor::new(vec!["bg".to_string()], 0, 600).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
    }

    #[test]
    fn upload_creates_normalized_active_layer() {
        let mut ed = editor();
        let id = ed
            .upload_image(b"fake", &StubDecoder { width: 300, height: 200 })
            .expect("upload");

        let layer = ed.layer(id).expect("layer exists");
        assert!((layer.width - 150.0).abs() < f32::EPSILON);
        assert!((layer.height - 100.0).abs() < f32::EPSILON);
        assert_eq!(layer.position, Point::new(50.0, 50.0));
        assert_eq!(ed.active_layer_id(), Some(id));
        assert_eq!(ed.tool(), Tool::Move);
    }

    #[test]
    fn rejected_upload_changes_nothing() {
        let mut ed = editor();
        let err = ed.upload_image(b"junk", &RejectingDecoder).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
        assert_eq!(ed.layer_count(), 0);
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn scale_then_drag_clamps_to_canvas() {
        // The 300x200 upload scenario: scaled to 2.0 the rendered box is
        // 300x200, so the far corner clamp is (500, 400) on 800x600.
        let mut ed = editor();
        let id = ed
            .upload_image(b"fake", &StubDecoder { width: 300, height: 200 })
            .expect("upload");

        assert!(ed.update_layer_transform(
            id,
            TransformPatch {
                scale: Some(2.0),
                ..TransformPatch::default()
            }
        ));
        let rendered = ed.layer(id).expect("layer").rendered_size();
        assert!((rendered.width - 300.0).abs() < f32::EPSILON);
        assert!((rendered.height - 200.0).abs() < f32::EPSILON);

        assert!(ed.update_layer_transform(
            id,
            TransformPatch {
                position: Some(Point::new(10_000.0, 10_000.0)),
                ..TransformPatch::default()
            }
        ));
        assert_eq!(
            ed.layer(id).expect("layer").position,
            Point::new(500.0, 400.0)
        );
    }

    #[test]
    fn scale_up_at_edge_reclamps_position() {
        let mut ed = editor();
        let id = ed
            .upload_image(b"fake", &StubDecoder { width: 300, height: 200 })
            .expect("upload");

        // Park the layer at the bottom-right corner at scale 1.
        ed.update_layer_transform(
            id,
            TransformPatch {
                position: Some(Point::new(10_000.0, 10_000.0)),
                ..TransformPatch::default()
            },
        );
        assert_eq!(
            ed.layer(id).expect("layer").position,
            Point::new(650.0, 500.0)
        );

        // Growing it must push the position back inside.
        ed.update_layer_transform(
            id,
            TransformPatch {
                scale: Some(2.0),
                ..TransformPatch::default()
            },
        );
        let layer = ed.layer(id).expect("layer");
        assert_eq!(layer.position, Point::new(500.0, 400.0));
    }

    #[test]
    fn scale_and_rotation_clamp_to_bounds() {
        let mut ed = editor();
        let id = ed.add_text_layer();

        ed.update_layer_transform(
            id,
            TransformPatch {
                scale: Some(99.0),
                rotation: Some(-700.0),
                ..TransformPatch::default()
            },
        );
        let layer = ed.layer(id).expect("layer");
        assert!((layer.scale - SCALE_MAX).abs() < f32::EPSILON);
        assert!((layer.rotation - ROTATION_MIN).abs() < f32::EPSILON);
    }

    #[test]
    fn pointer_drag_moves_layer() {
        let mut ed = editor();
        let id = ed.add_sticker_layer(StickerKind::Glasses); // 80x30 at (50,50)

        ed.handle_pointer(PointerEvent::down(60.0, 60.0));
        assert_eq!(ed.active_layer_id(), Some(id));

        ed.handle_pointer(PointerEvent::moved(160.0, 110.0));
        assert_eq!(
            ed.layer(id).expect("layer").position,
            Point::new(150.0, 100.0)
        );

        ed.handle_pointer(PointerEvent::up(160.0, 110.0));
        // Further moves without a press do nothing.
        ed.handle_pointer(PointerEvent::moved(400.0, 400.0));
        assert_eq!(
            ed.layer(id).expect("layer").position,
            Point::new(150.0, 100.0)
        );
    }

    #[test]
    fn pointer_down_on_empty_canvas_deselects() {
        let mut ed = editor();
        ed.add_sticker_layer(StickerKind::Crown);
        assert!(ed.active_layer_id().is_some());

        ed.handle_pointer(PointerEvent::down(700.0, 500.0));
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn pointer_down_switches_selection_to_hit_layer() {
        let mut ed = editor();
        let first = ed.add_sticker_layer(StickerKind::Glasses);
        let second = ed.add_sticker_layer(StickerKind::Crown);
        assert_eq!(ed.active_layer_id(), Some(second));

        // Move the crown away, then press on the glasses.
        ed.update_layer_transform(
            second,
            TransformPatch {
                position: Some(Point::new(400.0, 400.0)),
                ..TransformPatch::default()
            },
        );
        ed.handle_pointer(PointerEvent::down(60.0, 60.0));
        assert_eq!(ed.active_layer_id(), Some(first));
    }

    #[test]
    fn drawing_tool_captures_strokes_and_keeps_them() {
        let mut ed = editor();
        ed.set_tool(Tool::Pen);
        ed.handle_pointer(PointerEvent::down(10.0, 10.0));
        ed.handle_pointer(PointerEvent::moved(60.0, 60.0));
        ed.handle_pointer(PointerEvent::up(60.0, 60.0));
        assert!(!ed.drawing().is_empty());

        // Strokes survive a switch back to move, and the switch itself
        // leaves no selection behind.
        ed.set_tool(Tool::Move);
        assert!(!ed.drawing().is_empty());
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn entering_drawing_tool_clears_selection() {
        let mut ed = editor();
        ed.add_sticker_layer(StickerKind::Bling);
        assert!(ed.active_layer_id().is_some());

        ed.set_tool(Tool::Brush);
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn select_layer_requires_move_tool() {
        let mut ed = editor();
        let id = ed.add_sticker_layer(StickerKind::Cigar);
        ed.set_tool(Tool::Pen);

        assert!(!ed.select_layer(id));
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn delete_then_select_stale_id_is_noop() {
        let mut ed = editor();
        let id = ed.add_sticker_layer(StickerKind::Mustache);
        assert_eq!(ed.layer_count(), 1);

        assert_eq!(ed.delete_active_layer(), Some(id));
        assert_eq!(ed.layer_count(), 0);
        assert!(!ed.select_layer(id));
        assert_eq!(ed.active_layer_id(), None);
    }

    #[test]
    fn soft_reset_keeps_background_index() {
        let mut ed = editor();
        ed.cycle_background(Direction::Next);
        ed.add_text_layer();
        ed.set_tool(Tool::Pen);
        ed.handle_pointer(PointerEvent::down(5.0, 5.0));
        ed.handle_pointer(PointerEvent::moved(50.0, 50.0));
        ed.handle_pointer(PointerEvent::up(50.0, 50.0));

        ed.reset(false);
        assert_eq!(ed.layer_count(), 0);
        assert!(ed.drawing().is_empty());
        assert_eq!(ed.background_index(), 1);
    }

    #[test]
    fn hard_reset_rewinds_background_index() {
        let mut ed = editor();
        ed.cycle_background(Direction::Next);
        ed.add_text_layer();

        ed.reset(true);
        assert_eq!(ed.layer_count(), 0);
        assert_eq!(ed.background_index(), 0);
    }

    #[test]
    fn background_switch_discards_composition() {
        let mut ed = editor();
        ed.add_text_layer();
        ed.set_tool(Tool::Brush);
        ed.handle_pointer(PointerEvent::down(5.0, 5.0));
        ed.handle_pointer(PointerEvent::moved(50.0, 50.0));
        ed.handle_pointer(PointerEvent::up(50.0, 50.0));

        let index = ed.cycle_background(Direction::Next);
        assert_eq!(index, 1);
        assert_eq!(ed.layer_count(), 0);
        assert!(ed.drawing().is_empty());
    }

    #[test]
    fn export_snapshot_clears_selection() {
        let mut ed = editor();
        ed.add_text_layer();
        assert!(ed.active_layer_id().is_some());

        let snapshot = ed.export_snapshot();
        assert_eq!(ed.active_layer_id(), None);
        assert_eq!(snapshot.layers.len(), 1);
        assert!(snapshot.drawing.is_none());
        assert_eq!(snapshot.background, "bg-0");
    }

    #[test]
    fn snapshot_includes_drawing_once_painted() {
        let mut ed = editor();
        ed.set_tool(Tool::Pen);
        ed.handle_pointer(PointerEvent::down(10.0, 10.0));
        ed.handle_pointer(PointerEvent::moved(40.0, 40.0));
        ed.handle_pointer(PointerEvent::up(40.0, 40.0));

        let snapshot = ed.export_snapshot();
        assert!(snapshot.drawing.is_some());
    }

    #[test]
    fn edited_text_lands_in_snapshot() {
        let mut ed = editor();
        let id = ed.add_text_layer();
        assert!(ed.set_text_content(id, "HI").expect("text layer"));

        let snapshot = ed.export_snapshot();
        match &snapshot.layers[0].kind {
            LayerKind::Text { content, .. } => assert_eq!(content, "HI"),
            other => panic!("expected text layer, got {other:?}"),
        }
    }

    #[test]
    fn text_style_rejects_bad_color() {
        let mut ed = editor();
        let id = ed.add_text_layer();
        let err = ed.set_text_style(id, Some("red"), None).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
    }

    #[test]
    fn text_ops_reject_non_text_layers() {
        let mut ed = editor();
        let id = ed.add_sticker_layer(StickerKind::Crown);
        let err = ed.set_text_content(id, "nope").unwrap_err();
        assert!(matches!(err, EditorError::WrongLayerKind(_, "text")));
    }

    #[test]
    fn replace_layer_image_keeps_transform() {
        let mut ed = editor();
        let id = ed
            .upload_image(b"fake", &StubDecoder { width: 300, height: 200 })
            .expect("upload");
        ed.update_layer_transform(
            id,
            TransformPatch {
                position: Some(Point::new(200.0, 100.0)),
                rotation: Some(15.0),
                ..TransformPatch::default()
            },
        );

        // Replacement decodes new pixels but keeps layout and base dims.
        let replaced = ed
            .replace_layer_image(id, b"new", &StubDecoder { width: 64, height: 64 })
            .expect("image layer");
        assert!(replaced);
        let layer = ed.layer(id).expect("layer");
        assert_eq!(layer.position, Point::new(200.0, 100.0));
        assert!((layer.width - 150.0).abs() < f32::EPSILON);
        assert!((layer.height - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn set_brush_validates_and_clamps() {
        let mut ed = editor();
        ed.set_brush(Some("#FF0000"), Some(500.0)).expect("valid color");
        assert_eq!(ed.brush().color, "#FF0000");
        assert!((ed.brush().size - STROKE_WIDTH_MAX).abs() < f32::EPSILON);

        assert!(ed.set_brush(Some("blue"), None).is_err());
        assert_eq!(ed.brush().color, "#FF0000");
    }

    #[test]
    fn document_reflects_state() {
        let mut ed = editor();
        let id = ed.add_text_layer();
        let doc = ed.document();

        assert_eq!(doc.layers.len(), 1);
        assert_eq!(doc.active_layer, Some(id));
        assert_eq!(doc.background_count, 2);
        assert_eq!(doc.tool, Tool::Move);
        assert!(!doc.has_drawing);

        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["layers"][0]["kind"]["type"], "text");
    }
}
