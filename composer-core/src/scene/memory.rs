//! In-memory scene adapter.
//!
//! Keeps live objects in a map and records every call it receives. Used by
//! the CLI for headless inspection and by tests to observe reconciliation.

use std::collections::{HashMap, HashSet};

use crate::scene::{Construction, SceneAdapter, SceneError};
use crate::{FieldUpdate, Geometry, Layer, LayerId, LayerKind, VisualProps};

/// Handle of an object in a [`MemoryScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Raw handle number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// A decoded image, handed back to finish a deferred construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// A live object held by a [`MemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryObject {
    /// The layer this object was built for.
    pub layer_id: LayerId,
    /// Current geometry.
    pub geometry: Geometry,
    /// Current visual state.
    pub visual: VisualProps,
    /// Whether drag, resize and rotate are allowed.
    pub interactive: bool,
}

/// Call counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    /// Objects created.
    pub created: usize,
    /// Field updates applied.
    pub updated: usize,
    /// Objects removed.
    pub removed: usize,
    /// `set_paint_order` calls.
    pub reorders: usize,
    /// `request_repaint` calls.
    pub repaints: usize,
}

/// A [`SceneAdapter`] with no rendering behind it.
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: HashMap<ObjectHandle, MemoryObject>,
    order: Vec<ObjectHandle>,
    next_handle: u64,
    defer_images: bool,
    unavailable: HashSet<String>,
    stats: SceneStats,
}

impl MemoryScene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer image constructions with [`Construction::Deferred`].
    #[must_use]
    pub fn with_deferred_images(mut self) -> Self {
        self.defer_images = true;
        self
    }

    /// Make constructions from `src` fail.
    #[must_use]
    pub fn with_unavailable_source(mut self, src: impl Into<String>) -> Self {
        self.unavailable.insert(src.into());
        self
    }

    /// Look up a live object.
    #[must_use]
    pub fn object(&self, handle: ObjectHandle) -> Option<&MemoryObject> {
        self.objects.get(&handle)
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Handles back-to-front as of the last `set_paint_order`, followed by
    /// objects created since.
    #[must_use]
    pub fn paint_order(&self) -> &[ObjectHandle] {
        &self.order
    }

    /// Layer ids back-to-front.
    #[must_use]
    pub fn paint_order_layers(&self) -> Vec<LayerId> {
        self.order
            .iter()
            .filter_map(|handle| self.objects.get(handle))
            .map(|object| object.layer_id.clone())
            .collect()
    }

    /// Call counters.
    #[must_use]
    pub const fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Reset the call counters.
    pub fn reset_stats(&mut self) {
        self.stats = SceneStats::default();
    }

    /// Simulate the user dragging an object to `(x, y)`.
    ///
    /// Non-interactive (locked) objects do not move. Returns whether the
    /// object moved.
    pub fn move_object(&mut self, handle: ObjectHandle, x: f32, y: f32) -> bool {
        match self.objects.get_mut(&handle) {
            Some(object) if object.interactive => {
                object.geometry.x = x;
                object.geometry.y = y;
                true
            }
            _ => false,
        }
    }

    /// Simulate the user resizing or rotating an object.
    pub fn transform_object(&mut self, handle: ObjectHandle, geometry: Geometry) -> bool {
        match self.objects.get_mut(&handle) {
            Some(object) if object.interactive => {
                object.geometry = geometry;
                true
            }
            _ => false,
        }
    }

    fn check_source(&self, layer: &Layer) -> Result<(), SceneError> {
        match layer.kind.image_source() {
            Some(src) if src.trim().is_empty() => {
                Err(SceneError::SourceUnavailable("empty image source".to_string()))
            }
            Some(src) if self.unavailable.contains(src) => {
                Err(SceneError::SourceUnavailable(src.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, layer: &Layer) -> ObjectHandle {
        self.next_handle += 1;
        let handle = ObjectHandle(self.next_handle);
        self.objects.insert(
            handle,
            MemoryObject {
                layer_id: layer.id.clone(),
                geometry: layer.geometry(),
                visual: layer.visual(),
                interactive: true,
            },
        );
        self.order.push(handle);
        self.stats.created += 1;
        handle
    }
}

impl SceneAdapter for MemoryScene {
    type Handle = ObjectHandle;
    type Asset = DecodedImage;

    fn create_visual_object(
        &mut self,
        layer: &Layer,
    ) -> Result<Construction<ObjectHandle>, SceneError> {
        self.check_source(layer)?;
        if self.defer_images && layer.kind.image_source().is_some() {
            return Ok(Construction::Deferred);
        }
        Ok(Construction::Ready(self.insert(layer)))
    }

    fn create_from_asset(
        &mut self,
        layer: &Layer,
        asset: DecodedImage,
    ) -> Result<ObjectHandle, SceneError> {
        if asset.width == 0 || asset.height == 0 {
            return Err(SceneError::Construction(format!(
                "decoded image for {} is empty",
                layer.id
            )));
        }
        self.check_source(layer)?;
        Ok(self.insert(layer))
    }

    fn update_visual_object_field(&mut self, handle: ObjectHandle, update: &FieldUpdate) {
        let Some(object) = self.objects.get_mut(&handle) else {
            tracing::warn!("Update for unknown scene object {handle}");
            return;
        };
        apply_update(object, update);
        self.stats.updated += 1;
    }

    fn remove_visual_object(&mut self, handle: ObjectHandle) {
        if self.objects.remove(&handle).is_some() {
            self.order.retain(|h| *h != handle);
            self.stats.removed += 1;
        }
    }

    fn set_paint_order(&mut self, order: &[ObjectHandle]) {
        let mut restacked: Vec<ObjectHandle> = order
            .iter()
            .copied()
            .filter(|handle| self.objects.contains_key(handle))
            .collect();
        // Objects the caller did not mention keep their relative order at the back.
        let missing: Vec<ObjectHandle> = self
            .order
            .iter()
            .copied()
            .filter(|handle| !restacked.contains(handle))
            .collect();
        restacked.splice(0..0, missing);
        self.order = restacked;
        self.stats.reorders += 1;
    }

    fn set_interaction_enabled(&mut self, handle: ObjectHandle, enabled: bool) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.interactive = enabled;
        }
    }

    fn live_geometry(&self, handle: ObjectHandle) -> Option<Geometry> {
        self.objects.get(&handle).map(|object| object.geometry)
    }

    fn visual_props(&self, handle: ObjectHandle) -> Option<VisualProps> {
        self.objects.get(&handle).map(|object| object.visual.clone())
    }

    fn request_repaint(&mut self) {
        self.stats.repaints += 1;
    }
}

fn apply_update(object: &mut MemoryObject, update: &FieldUpdate) {
    let visual = &mut object.visual;
    match (&mut visual.kind, update) {
        (_, FieldUpdate::Geometry(geometry)) => object.geometry = *geometry,
        (_, FieldUpdate::Opacity(opacity)) => visual.opacity = *opacity,
        (LayerKind::Text(style), FieldUpdate::Text(text)) => style.text.clone_from(text),
        (LayerKind::Text(style), FieldUpdate::FontFamily(family)) => {
            style.font_family.clone_from(family);
        }
        (LayerKind::Text(style), FieldUpdate::FontSize(size)) => style.font_size = *size,
        (LayerKind::Text(style), FieldUpdate::FontWeight(weight)) => {
            style.font_weight.clone_from(weight);
        }
        (LayerKind::Text(style), FieldUpdate::FontStyle(slant)) => style.font_style = *slant,
        (LayerKind::Text(style), FieldUpdate::Fill(color)) => style.color.clone_from(color),
        (LayerKind::Text(style), FieldUpdate::TextAlign(align)) => style.text_align = *align,
        (LayerKind::Text(style), FieldUpdate::Underline(on)) => style.underline = *on,
        (LayerKind::Text(style), FieldUpdate::Strikethrough(on)) => style.strikethrough = *on,
        (LayerKind::Image(image), FieldUpdate::Source(src)) => image.src.clone_from(src),
        (LayerKind::Shape(style), FieldUpdate::Fill(color)) => style.fill.clone_from(color),
        (LayerKind::Shape(style), FieldUpdate::Stroke(color)) => style.stroke.clone_from(color),
        (LayerKind::Shape(style), FieldUpdate::StrokeWidth(width)) => {
            style.stroke_width = *width;
        }
        (kind, update) => {
            tracing::warn!(
                "Ignoring {update:?} for {:?} object {}",
                kind.layer_type(),
                object.layer_id
            );
        }
    }
}
