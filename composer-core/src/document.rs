//! The document: canvas dimensions, background and the layer list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::{ComposerError, ComposerResult, Layer, LayerId};

/// Default document width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;

/// Default document height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

/// Default document background.
pub const DEFAULT_CANVAS_BACKGROUND: &str = "#ffffff";

/// Order items back-to-front: everything that is not text first, then text,
/// preserving relative order within each group.
#[must_use]
pub fn text_last<T>(items: impl IntoIterator<Item = T>, is_text: impl Fn(&T) -> bool) -> Vec<T> {
    let (text, mut order): (Vec<T>, Vec<T>) = items.into_iter().partition(|item| is_text(item));
    order.extend(text);
    order
}

/// The complete, self-contained description of a composition.
///
/// `layers` is in insertion order; paint order is derived from it by
/// [`DocumentState::paint_order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    /// Document width in pixels.
    pub width: f32,
    /// Document height in pixels.
    pub height: f32,
    /// Background color as hex.
    pub background_color: String,
    /// Layers in insertion order.
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Currently selected layer, if any.
    #[serde(default)]
    pub selected_layer_id: Option<LayerId>,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl DocumentState {
    /// Create an empty document with a white background.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background_color: DEFAULT_CANVAS_BACKGROUND.to_string(),
            layers: Vec::new(),
            selected_layer_id: None,
        }
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Get a layer by ID.
    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| &layer.id == id)
    }

    /// Get a mutable reference to a layer by ID.
    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| &layer.id == id)
    }

    /// Check whether a layer with this id exists.
    #[must_use]
    pub fn contains(&self, id: &LayerId) -> bool {
        self.layer(id).is_some()
    }

    /// Append a layer.
    ///
    /// Only the current layers are checked for a clash. Retired ids are
    /// tracked by [`EditorSession`](crate::EditorSession).
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::DuplicateLayerId`] if the id is already used.
    pub fn add_layer(&mut self, mut layer: Layer) -> ComposerResult<LayerId> {
        if self.contains(&layer.id) {
            return Err(ComposerError::DuplicateLayerId(layer.id.to_string()));
        }
        layer.normalize();
        let id = layer.id.clone();
        self.layers.push(layer);
        Ok(id)
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn remove_layer(&mut self, id: &LayerId) -> ComposerResult<Layer> {
        let index = self
            .layers
            .iter()
            .position(|layer| &layer.id == id)
            .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
        if self.selected_layer_id.as_ref() == Some(id) {
            self.selected_layer_id = None;
        }
        Ok(self.layers.remove(index))
    }

    /// Set or clear the selection.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if `id` names no layer.
    pub fn select(&mut self, id: Option<&LayerId>) -> ComposerResult<()> {
        match id {
            Some(id) if !self.contains(id) => Err(ComposerError::LayerNotFound(id.to_string())),
            _ => {
                self.selected_layer_id = id.cloned();
                Ok(())
            }
        }
    }

    /// The currently selected layer.
    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected_layer_id
            .as_ref()
            .and_then(|id| self.layer(id))
    }

    /// Layers back-to-front: non-text layers first, text layers last.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Layer> {
        text_last(&self.layers, |layer| layer.is_text())
    }

    /// Topmost layer whose bounds contain the point.
    #[must_use]
    pub fn layer_at(&self, x: f32, y: f32) -> Option<&Layer> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|layer| layer.contains_point(x, y))
    }

    /// Document rectangle, if the dimensions are usable.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        (usable(self.width) && usable(self.height))
            .then(|| Rect::new(0.0, 0.0, self.width, self.height))
    }

    /// Remove every layer and the selection.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected_layer_id = None;
    }

    /// Get the number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Check if the document has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Check the id-uniqueness and selection invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> ComposerResult<()> {
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(&layer.id) {
                return Err(ComposerError::DuplicateLayerId(layer.id.to_string()));
            }
        }
        if let Some(id) = &self.selected_layer_id {
            if !seen.contains(id) {
                return Err(ComposerError::LayerNotFound(id.to_string()));
            }
        }
        Ok(())
    }

    /// Repair a document loaded from outside: normalize every layer, drop
    /// repeated ids (first occurrence wins) and clear a dangling selection.
    pub fn sanitize(&mut self) {
        let mut seen = HashSet::new();
        self.layers.retain(|layer| {
            let fresh = seen.insert(layer.id.clone());
            if !fresh {
                tracing::warn!("Dropping layer with duplicate id {}", layer.id);
            }
            fresh
        });
        for layer in &mut self.layers {
            layer.normalize();
        }
        if let Some(id) = &self.selected_layer_id {
            if !seen.contains(id) {
                tracing::warn!("Clearing selection of missing layer {id}");
                self.selected_layer_id = None;
            }
        }
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        serde_json::to_string(self).map_err(ComposerError::Serialization)
    }

    /// Serialize the document to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> ComposerResult<String> {
        serde_json::to_string_pretty(self).map_err(ComposerError::Serialization)
    }

    /// Deserialize and sanitize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a document.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        let mut document: Self = serde_json::from_str(json)?;
        document.sanitize();
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShapeKind, ShapeStyle, TextStyle};

    fn ids(layers: &[&Layer]) -> Vec<String> {
        layers.iter().map(|l| l.id.to_string()).collect()
    }

    #[test]
    fn test_default_document() {
        let doc = DocumentState::default();
        assert!((doc.width - 800.0).abs() < f32::EPSILON);
        assert!((doc.height - 600.0).abs() < f32::EPSILON);
        assert_eq!(doc.background_color, "#ffffff");
        assert!(doc.is_empty());
        assert!(doc.selected_layer_id.is_none());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut doc = DocumentState::default();
        doc.add_layer(Layer::image("a.png").with_id("a"))
            .expect("first add");
        let result = doc.add_layer(Layer::image("b.png").with_id("a"));
        assert!(matches!(result, Err(ComposerError::DuplicateLayerId(_))));
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut doc = DocumentState::default();
        let id = doc
            .add_layer(Layer::image("a.png"))
            .expect("add");
        doc.select(Some(&id)).expect("select");
        doc.remove_layer(&id).expect("remove");
        assert!(doc.selected_layer_id.is_none());
        assert!(matches!(
            doc.remove_layer(&id),
            Err(ComposerError::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_select_unknown_layer_is_an_error() {
        let mut doc = DocumentState::default();
        let result = doc.select(Some(&LayerId::from("ghost")));
        assert!(matches!(result, Err(ComposerError::LayerNotFound(_))));
        doc.select(None).expect("clearing is always allowed");
    }

    #[test]
    fn test_paint_order_puts_text_last_stably() {
        let mut doc = DocumentState::default();
        doc.add_layer(Layer::text(TextStyle::new("one")).with_id("t1"))
            .expect("add");
        doc.add_layer(Layer::shape(ShapeStyle::default()).with_id("s1"))
            .expect("add");
        doc.add_layer(Layer::text(TextStyle::new("two")).with_id("t2"))
            .expect("add");
        doc.add_layer(Layer::image("x.png").with_id("i1"))
            .expect("add");

        assert_eq!(ids(&doc.paint_order()), vec!["s1", "i1", "t1", "t2"]);
    }

    #[test]
    fn test_layer_at_prefers_topmost_in_paint_order() {
        let mut doc = DocumentState::default();
        doc.add_layer(
            Layer::text(TextStyle::new("label"))
                .with_id("t")
                .with_position(0.0, 0.0)
                .with_size(100.0, 100.0),
        )
        .expect("add");
        doc.add_layer(
            Layer::shape(ShapeStyle::new(ShapeKind::Rectangle))
                .with_id("s")
                .with_position(0.0, 0.0)
                .with_size(200.0, 200.0),
        )
        .expect("add");

        assert_eq!(doc.layer_at(50.0, 50.0).map(|l| l.id.as_str()), Some("t"));
        assert_eq!(
            doc.layer_at(150.0, 150.0).map(|l| l.id.as_str()),
            Some("s")
        );
        assert!(doc.layer_at(500.0, 500.0).is_none());
    }

    #[test]
    fn test_bounds_require_positive_dimensions() {
        assert!(DocumentState::new(800.0, 600.0).bounds().is_some());
        assert!(DocumentState::new(0.0, 600.0).bounds().is_none());
        assert!(DocumentState::new(800.0, f32::NAN).bounds().is_none());
    }

    #[test]
    fn test_from_json_sanitizes() {
        let json = r##"{
            "width": 800, "height": 600, "backgroundColor": "#fff",
            "selectedLayerId": "gone",
            "layers": [
                {"id": "a", "type": "image", "src": "a.png", "x": 0, "y": 0,
                 "width": -5, "height": 10, "rotation": 0, "opacity": 3},
                {"id": "a", "type": "image", "src": "b.png", "x": 0, "y": 0,
                 "width": 5, "height": 10, "rotation": 0, "opacity": 1}
            ]
        }"##;
        let doc = DocumentState::from_json(json).expect("parse");
        assert_eq!(doc.layer_count(), 1);
        assert_eq!(doc.layers[0].kind.image_source(), Some("a.png"));
        assert!(doc.layers[0].width.abs() < f32::EPSILON);
        assert!((doc.layers[0].opacity - 1.0).abs() < f32::EPSILON);
        assert!(doc.selected_layer_id.is_none());
        doc.validate().expect("sanitized document is valid");
    }

    #[test]
    fn test_json_round_trip_preserves_document() {
        let mut doc = DocumentState::new(1080.0, 1080.0).with_background("#101010");
        let id = doc
            .add_layer(Layer::text(TextStyle::new("Hello")).with_position(10.0, 20.0))
            .expect("add");
        doc.select(Some(&id)).expect("select");

        let restored = DocumentState::from_json(&doc.to_json().expect("json")).expect("parse");
        assert_eq!(restored, doc);
    }
}
