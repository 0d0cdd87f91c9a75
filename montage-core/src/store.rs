//! Ordered layer storage and active-layer selection.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::layer::{Layer, LayerId};

/// Owns the ordered collection of layers and the current selection.
///
/// Stacking order is insertion order: the last-added layer paints on top.
/// Operations addressing a stale/unknown id are no-ops that report `false`
/// or `None`, never errors, so out-of-order UI events are harmless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStore {
    layers: Vec<Layer>,
    active: Option<LayerId>,
}

impl LayerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer as topmost and make it the active selection.
    pub fn add(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        self.layers.push(layer);
        self.active = Some(id);
        id
    }

    /// Get a layer by id.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Apply `f` to the layer matching `id`. Returns whether a layer was
    /// found and updated.
    pub fn update<F>(&mut self, id: LayerId, f: F) -> bool
    where
        F: FnOnce(&mut Layer),
    {
        match self.layers.iter_mut().find(|layer| layer.id == id) {
            Some(layer) => {
                f(layer);
                true
            }
            None => false,
        }
    }

    /// Remove a layer. Clears the selection if the removed layer was
    /// active. Returns the removed layer, or `None` for a stale id.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.layers.iter().position(|layer| layer.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.layers.remove(index))
    }

    /// Set the active selection. Selecting an unknown id is a no-op;
    /// `None` always clears. Returns whether the selection changed state
    /// as requested.
    pub fn set_active(&mut self, id: Option<LayerId>) -> bool {
        match id {
            Some(id) => {
                if self.get(id).is_some() {
                    self.active = Some(id);
                    true
                } else {
                    false
                }
            }
            None => {
                self.active = None;
                true
            }
        }
    }

    /// Currently active layer id, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<LayerId> {
        self.active
    }

    /// Currently active layer, if any.
    #[must_use]
    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.get(id))
    }

    /// Topmost layer whose hit region contains `point`.
    #[must_use]
    pub fn layer_at(&self, point: Point) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.contains_point(point))
            .map(|layer| layer.id)
    }

    /// Layers in stacking order (bottom first).
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the store holds no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Remove all layers and clear the selection.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.active = None;
    }
}
