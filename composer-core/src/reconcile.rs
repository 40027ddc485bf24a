//! Bringing the live scene into line with the document.
//!
//! ## Algorithm
//!
//! ```text
//! for each desired layer:
//!     live object exists  -> patch differing visual fields (or rebuild on type change)
//!     construction pending -> keep waiting unless the source changed
//!     otherwise            -> construct (ready, deferred or skipped)
//! remove objects whose layer is gone
//! restack: non-text handles first, text handles last (stable)
//! repaint
//! ```
//!
//! Geometry is only pushed into existing objects under [`GeometrySync::Apply`].
//! Under the default [`GeometrySync::Preserve`] the scene owns geometry once an
//! object exists, so a drag in progress is never fought.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::document::text_last;
use crate::scene::{Construction, SceneAdapter, SceneError};
use crate::{FieldUpdate, Layer, LayerId, StylePatch, VisualProps};

/// Whether reconciliation pushes model geometry into existing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometrySync {
    /// Leave live geometry alone; it flows scene -> model through events.
    #[default]
    Preserve,
    /// Move existing objects to the model's geometry where it differs.
    Apply,
}

/// A construction waiting for an asynchronously loaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConstruction {
    /// Ticket number, unique per reconciler.
    pub ticket: u64,
    /// Layer being constructed.
    pub layer_id: LayerId,
    /// Image source the asset must be loaded from.
    pub source: String,
}

/// A layer that could not be given a visual object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLayer {
    /// The layer.
    pub layer_id: LayerId,
    /// Why construction failed.
    pub error: SceneError,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Layers that got a new visual object.
    pub created: Vec<LayerId>,
    /// Layers whose object was patched, rebuilt or re-locked.
    pub updated: Vec<LayerId>,
    /// Layers whose object was removed.
    pub removed: Vec<LayerId>,
    /// Layers that failed to construct.
    pub skipped: Vec<SkippedLayer>,
    /// Constructions now waiting for an asset.
    pub deferred: Vec<PendingConstruction>,
    /// Whether the paint order was re-applied.
    pub reordered: bool,
}

impl ReconcileReport {
    /// Whether the pass changed nothing on the scene (beyond a repaint).
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.removed.is_empty()
            && self.skipped.is_empty()
            && self.deferred.is_empty()
            && !self.reordered
    }
}

/// Result of handing a loaded asset back to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionOutcome<H> {
    /// The object was created.
    Applied(H),
    /// The ticket no longer matches the desired state; the asset was dropped.
    Stale,
    /// The adapter rejected the asset; the layer is skipped.
    Failed(SceneError),
}

#[derive(Debug, Clone, Copy)]
struct LiveObject<H> {
    handle: H,
    locked: bool,
}

/// Keeps a [`SceneAdapter`] in correspondence with a layer list.
#[derive(Debug)]
pub struct Reconciler<H> {
    live: HashMap<LayerId, LiveObject<H>>,
    by_handle: HashMap<H, LayerId>,
    pending: HashMap<LayerId, PendingConstruction>,
    /// Visual state of layers whose construction failed, so they are only
    /// retried once they change.
    failed: HashMap<LayerId, VisualProps>,
    desired: Vec<Layer>,
    paint_order: Vec<H>,
    next_ticket: u64,
}

impl<H> Default for Reconciler<H> {
    fn default() -> Self {
        Self {
            live: HashMap::new(),
            by_handle: HashMap::new(),
            pending: HashMap::new(),
            failed: HashMap::new(),
            desired: Vec::new(),
            paint_order: Vec::new(),
            next_ticket: 0,
        }
    }
}

impl<H: Copy + Eq + Hash + Debug> Reconciler<H> {
    /// Create a reconciler with no live objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronize `scene` with `layers`.
    pub fn reconcile<S>(
        &mut self,
        scene: &mut S,
        layers: &[Layer],
        sync: GeometrySync,
    ) -> ReconcileReport
    where
        S: SceneAdapter<Handle = H>,
    {
        let mut report = ReconcileReport::default();
        self.desired = layers.to_vec();

        for layer in layers {
            self.sync_layer(scene, layer, sync, &mut report);
        }

        let stale: Vec<LayerId> = self
            .live
            .keys()
            .filter(|id| !layers.iter().any(|layer| &layer.id == *id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(object) = self.live.remove(&id) {
                self.by_handle.remove(&object.handle);
                scene.remove_visual_object(object.handle);
                report.removed.push(id);
            }
        }
        self.pending
            .retain(|id, _| layers.iter().any(|layer| &layer.id == id));
        self.failed
            .retain(|id, _| layers.iter().any(|layer| &layer.id == id));

        report.reordered = self.apply_paint_order(scene);
        scene.request_repaint();

        if report.is_noop() {
            tracing::trace!("Reconcile: scene already up to date");
        } else {
            tracing::debug!(
                created = report.created.len(),
                updated = report.updated.len(),
                removed = report.removed.len(),
                skipped = report.skipped.len(),
                deferred = report.deferred.len(),
                reordered = report.reordered,
                "Reconciled scene"
            );
        }
        report
    }

    /// Finish a deferred construction with its loaded asset.
    ///
    /// The asset is applied only if `ticket` is still the current pending
    /// construction for its layer and the layer still wants the same source.
    pub fn complete_construction<S>(
        &mut self,
        scene: &mut S,
        ticket: &PendingConstruction,
        asset: S::Asset,
    ) -> ConstructionOutcome<H>
    where
        S: SceneAdapter<Handle = H>,
    {
        let Some(layer) = self.take_current(ticket) else {
            tracing::debug!(
                "Discarding stale construction #{} for {}",
                ticket.ticket,
                ticket.layer_id
            );
            return ConstructionOutcome::Stale;
        };

        match scene.create_from_asset(&layer, asset) {
            Ok(handle) => {
                self.register(scene, &layer, handle);
                self.apply_paint_order(scene);
                scene.request_repaint();
                ConstructionOutcome::Applied(handle)
            }
            Err(error) => {
                tracing::warn!("Skipping layer {}: {error}", layer.id);
                self.failed.insert(layer.id.clone(), layer.visual());
                ConstructionOutcome::Failed(error)
            }
        }
    }

    /// Record that loading the asset for `ticket` failed.
    ///
    /// Returns `false` if the ticket was already stale.
    pub fn fail_construction(&mut self, ticket: &PendingConstruction, error: &SceneError) -> bool {
        let Some(layer) = self.take_current(ticket) else {
            tracing::debug!("Ignoring failure of stale construction #{}", ticket.ticket);
            return false;
        };
        tracing::warn!("Skipping layer {}: {error}", layer.id);
        self.failed.insert(layer.id.clone(), layer.visual());
        true
    }

    /// Live handle of a layer.
    #[must_use]
    pub fn handle_for(&self, id: &LayerId) -> Option<H> {
        self.live.get(id).map(|object| object.handle)
    }

    /// Layer a live handle belongs to.
    #[must_use]
    pub fn layer_for_handle(&self, handle: H) -> Option<&LayerId> {
        self.by_handle.get(&handle)
    }

    /// Whether a construction for this layer is waiting on an asset.
    #[must_use]
    pub fn is_pending(&self, id: &LayerId) -> bool {
        self.pending.contains_key(id)
    }

    /// Handles back-to-front, as last applied to the scene.
    #[must_use]
    pub fn paint_order(&self) -> &[H] {
        &self.paint_order
    }

    /// Layer ids back-to-front, as last applied to the scene.
    #[must_use]
    pub fn paint_order_ids(&self) -> Vec<LayerId> {
        self.paint_order
            .iter()
            .filter_map(|handle| self.by_handle.get(handle).cloned())
            .collect()
    }

    /// Remove every live object and forget all pending constructions.
    pub fn clear<S>(&mut self, scene: &mut S)
    where
        S: SceneAdapter<Handle = H>,
    {
        for (_, object) in self.live.drain() {
            scene.remove_visual_object(object.handle);
        }
        self.by_handle.clear();
        self.pending.clear();
        self.failed.clear();
        self.desired.clear();
        self.paint_order.clear();
        scene.request_repaint();
    }

    fn sync_layer<S>(
        &mut self,
        scene: &mut S,
        layer: &Layer,
        sync: GeometrySync,
        report: &mut ReconcileReport,
    ) where
        S: SceneAdapter<Handle = H>,
    {
        if let Some(object) = self.live.get(&layer.id).copied() {
            if let Some(current) = scene.visual_props(object.handle) {
                self.patch(scene, layer, object, &current, sync, report);
                return;
            }
            tracing::warn!("Scene lost the object for {}; rebuilding", layer.id);
            self.live.remove(&layer.id);
            self.by_handle.remove(&object.handle);
        }

        if let Some(pending) = self.pending.get(&layer.id) {
            if layer.kind.image_source() == Some(pending.source.as_str()) {
                return;
            }
            tracing::debug!("Source of {} changed while loading", layer.id);
            self.pending.remove(&layer.id);
        }

        if self.failed.get(&layer.id) == Some(&layer.visual()) {
            return;
        }
        self.failed.remove(&layer.id);
        self.construct(scene, layer, report);
    }

    fn patch<S>(
        &mut self,
        scene: &mut S,
        layer: &Layer,
        object: LiveObject<H>,
        current: &VisualProps,
        sync: GeometrySync,
        report: &mut ReconcileReport,
    ) where
        S: SceneAdapter<Handle = H>,
    {
        let mut updates = match current.diff(&layer.visual()) {
            StylePatch::Fields(updates) => updates,
            StylePatch::Rebuild => {
                self.rebuild(scene, layer, object.handle, sync, report);
                return;
            }
        };
        if sync == GeometrySync::Apply
            && scene.live_geometry(object.handle) != Some(layer.geometry())
        {
            updates.push(FieldUpdate::Geometry(layer.geometry()));
        }
        for update in &updates {
            scene.update_visual_object_field(object.handle, update);
        }

        let relocked = object.locked != layer.locked;
        if relocked {
            scene.set_interaction_enabled(object.handle, !layer.locked);
            if let Some(entry) = self.live.get_mut(&layer.id) {
                entry.locked = layer.locked;
            }
        }
        if relocked || !updates.is_empty() {
            report.updated.push(layer.id.clone());
        }
    }

    fn rebuild<S>(
        &mut self,
        scene: &mut S,
        layer: &Layer,
        old: H,
        sync: GeometrySync,
        report: &mut ReconcileReport,
    ) where
        S: SceneAdapter<Handle = H>,
    {
        let mut replacement = layer.clone();
        if sync == GeometrySync::Preserve {
            if let Some(geometry) = scene.live_geometry(old) {
                replacement.set_geometry(geometry);
            }
        }
        self.live.remove(&layer.id);
        self.by_handle.remove(&old);
        scene.remove_visual_object(old);
        tracing::debug!("Rebuilding object for {}", layer.id);

        let mut scratch = ReconcileReport::default();
        self.construct(scene, &replacement, &mut scratch);
        report.updated.extend(scratch.created);
        report.skipped.extend(scratch.skipped);
        report.deferred.extend(scratch.deferred);
    }

    fn construct<S>(&mut self, scene: &mut S, layer: &Layer, report: &mut ReconcileReport)
    where
        S: SceneAdapter<Handle = H>,
    {
        match scene.create_visual_object(layer) {
            Ok(Construction::Ready(handle)) => {
                self.register(scene, layer, handle);
                report.created.push(layer.id.clone());
            }
            Ok(Construction::Deferred) => {
                self.next_ticket += 1;
                let pending = PendingConstruction {
                    ticket: self.next_ticket,
                    layer_id: layer.id.clone(),
                    source: layer.kind.image_source().unwrap_or_default().to_string(),
                };
                self.pending.insert(layer.id.clone(), pending.clone());
                report.deferred.push(pending);
            }
            Err(error) => {
                tracing::warn!("Skipping layer {}: {error}", layer.id);
                self.failed.insert(layer.id.clone(), layer.visual());
                report.skipped.push(SkippedLayer {
                    layer_id: layer.id.clone(),
                    error,
                });
            }
        }
    }

    fn register<S>(&mut self, scene: &mut S, layer: &Layer, handle: H)
    where
        S: SceneAdapter<Handle = H>,
    {
        scene.set_interaction_enabled(handle, !layer.locked);
        self.live.insert(
            layer.id.clone(),
            LiveObject {
                handle,
                locked: layer.locked,
            },
        );
        self.by_handle.insert(handle, layer.id.clone());
    }

    /// Remove and return the desired layer for `ticket` if it is current.
    fn take_current(&mut self, ticket: &PendingConstruction) -> Option<Layer> {
        let current = self
            .pending
            .get(&ticket.layer_id)
            .is_some_and(|pending| pending.ticket == ticket.ticket);
        if !current {
            return None;
        }
        self.pending.remove(&ticket.layer_id);
        self.desired
            .iter()
            .find(|layer| layer.id == ticket.layer_id)
            .filter(|layer| layer.kind.image_source() == Some(ticket.source.as_str()))
            .cloned()
    }

    fn apply_paint_order<S>(&mut self, scene: &mut S) -> bool
    where
        S: SceneAdapter<Handle = H>,
    {
        let order: Vec<H> = text_last(
            self.desired.iter().filter_map(|layer| {
                self.live
                    .get(&layer.id)
                    .map(|object| (layer.is_text(), object.handle))
            }),
            |(is_text, _)| *is_text,
        )
        .into_iter()
        .map(|(_, handle)| handle)
        .collect();

        if order == self.paint_order {
            return false;
        }
        scene.set_paint_order(&order);
        self.paint_order = order;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DecodedImage, MemoryScene, ObjectHandle};
    use crate::{ShapeKind, ShapeStyle, TextStyle};
    use proptest::prelude::*;

    fn text(id: &str) -> Layer {
        Layer::text(TextStyle::new(id)).with_id(id)
    }

    fn shape(id: &str) -> Layer {
        Layer::shape(ShapeStyle::default()).with_id(id)
    }

    fn order_ids(reconciler: &Reconciler<ObjectHandle>) -> Vec<String> {
        reconciler
            .paint_order_ids()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_creates_objects_and_orders_text_last() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let layers = vec![text("t1"), shape("s1"), text("t2"), shape("s2")];

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

        assert_eq!(report.created.len(), 4);
        assert!(report.reordered);
        assert_eq!(order_ids(&reconciler), vec!["s1", "s2", "t1", "t2"]);
        assert_eq!(scene.paint_order(), reconciler.paint_order());
        assert_eq!(scene.stats().repaints, 1);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let layers = vec![text("t1"), shape("s1")];
        reconciler.reconcile(&mut scene, &layers, GeometrySync::Apply);
        let before = scene.stats();

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Apply);

        assert!(report.is_noop());
        let after = scene.stats();
        assert_eq!(after.created, before.created);
        assert_eq!(after.updated, before.updated);
        assert_eq!(after.removed, before.removed);
        assert_eq!(after.reorders, before.reorders);
        assert_eq!(after.repaints, before.repaints + 1);
    }

    #[test]
    fn test_patches_only_changed_fields_and_keeps_live_geometry() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let mut layers = vec![text("t1")];
        reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        let handle = reconciler.handle_for(&LayerId::from("t1")).expect("live");

        // The user is mid-drag.
        scene.move_object(handle, 300.0, 300.0);
        if let crate::LayerKind::Text(style) = &mut layers[0].kind {
            style.text = "changed".to_string();
        }
        scene.reset_stats();

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

        assert_eq!(report.updated, vec![LayerId::from("t1")]);
        assert_eq!(scene.stats().updated, 1);
        assert_eq!(scene.stats().created, 0);
        let live = scene.live_geometry(handle).expect("live");
        assert!((live.x - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_moves_existing_objects() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let mut layers = vec![shape("s1")];
        reconciler.reconcile(&mut scene, &layers, GeometrySync::Apply);
        layers[0].x = 42.0;

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Apply);

        assert_eq!(report.updated.len(), 1);
        let handle = reconciler.handle_for(&LayerId::from("s1")).expect("live");
        let live = scene.live_geometry(handle).expect("live");
        assert!((live.x - 42.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_removes_stale_objects() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(&mut scene, &[text("t1"), shape("s1")], GeometrySync::Preserve);

        let report = reconciler.reconcile(&mut scene, &[text("t1")], GeometrySync::Preserve);

        assert_eq!(report.removed, vec![LayerId::from("s1")]);
        assert_eq!(scene.object_count(), 1);
        assert!(reconciler.handle_for(&LayerId::from("s1")).is_none());
    }

    #[test]
    fn test_failed_construction_skips_only_that_layer() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let layers = vec![Layer::image("").with_id("broken"), text("t1"), shape("s1")];

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].layer_id, LayerId::from("broken"));
        assert_eq!(order_ids(&reconciler), vec!["s1", "t1"]);

        // Not retried until the layer changes.
        let again = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        assert!(again.is_noop());
    }

    #[test]
    fn test_shape_kind_change_rebuilds_at_live_geometry() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let mut layers = vec![shape("s1"), text("t1")];
        reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        let old = reconciler.handle_for(&LayerId::from("s1")).expect("live");
        scene.move_object(old, 77.0, 0.0);

        layers[0].kind = crate::LayerKind::Shape(ShapeStyle::new(ShapeKind::Circle));
        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

        let new = reconciler.handle_for(&LayerId::from("s1")).expect("live");
        assert_ne!(old, new);
        assert!(scene.object(old).is_none());
        assert_eq!(report.updated, vec![LayerId::from("s1")]);
        assert!(report.reordered);
        let live = scene.live_geometry(new).expect("live");
        assert!((live.x - 77.0).abs() < f32::EPSILON);
        assert_eq!(order_ids(&reconciler), vec!["s1", "t1"]);
    }

    #[test]
    fn test_lock_state_is_mirrored() {
        let mut scene = MemoryScene::new();
        let mut reconciler = Reconciler::new();
        let mut layers = vec![shape("s1")];
        reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        let handle = reconciler.handle_for(&LayerId::from("s1")).expect("live");
        assert!(scene.object(handle).is_some_and(|o| o.interactive));

        layers[0].locked = true;
        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

        assert_eq!(report.updated.len(), 1);
        assert!(scene.object(handle).is_some_and(|o| !o.interactive));
    }

    #[test]
    fn test_deferred_construction_applies_when_current() {
        let mut scene = MemoryScene::new().with_deferred_images();
        let mut reconciler = Reconciler::new();
        let layers = vec![text("t1"), Layer::image("photo.png").with_id("i1")];

        let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        assert_eq!(report.deferred.len(), 1);
        assert!(reconciler.is_pending(&LayerId::from("i1")));

        // A second pass keeps waiting instead of issuing a new ticket.
        let again = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
        assert!(again.deferred.is_empty());

        let outcome = reconciler.complete_construction(
            &mut scene,
            &report.deferred[0],
            DecodedImage { width: 10, height: 10 },
        );
        assert!(matches!(outcome, ConstructionOutcome::Applied(_)));
        assert_eq!(order_ids(&reconciler), vec!["i1", "t1"]);
        assert_eq!(scene.paint_order_layers(), reconciler.paint_order_ids());
    }

    #[test]
    fn test_stale_construction_is_discarded() {
        let mut scene = MemoryScene::new().with_deferred_images();
        let mut reconciler = Reconciler::new();
        let report = reconciler.reconcile(
            &mut scene,
            &[Layer::image("photo.png").with_id("i1")],
            GeometrySync::Preserve,
        );
        let ticket = report.deferred[0].clone();

        // The layer is deleted before its image finishes loading.
        reconciler.reconcile(&mut scene, &[], GeometrySync::Preserve);

        let outcome = reconciler.complete_construction(
            &mut scene,
            &ticket,
            DecodedImage { width: 10, height: 10 },
        );
        assert_eq!(outcome, ConstructionOutcome::Stale);
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_source_change_supersedes_ticket() {
        let mut scene = MemoryScene::new().with_deferred_images();
        let mut reconciler = Reconciler::new();
        let first = reconciler.reconcile(
            &mut scene,
            &[Layer::image("a.png").with_id("i1")],
            GeometrySync::Preserve,
        );
        let second = reconciler.reconcile(
            &mut scene,
            &[Layer::image("b.png").with_id("i1")],
            GeometrySync::Preserve,
        );
        assert_eq!(second.deferred.len(), 1);

        let stale = reconciler.complete_construction(
            &mut scene,
            &first.deferred[0],
            DecodedImage { width: 1, height: 1 },
        );
        assert_eq!(stale, ConstructionOutcome::Stale);
        assert!(!reconciler.fail_construction(
            &first.deferred[0],
            &SceneError::SourceUnavailable("a.png".into())
        ));
        assert!(reconciler.fail_construction(
            &second.deferred[0],
            &SceneError::SourceUnavailable("b.png".into())
        ));
        assert_eq!(scene.object_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_text_handles_follow_non_text(kinds in prop::collection::vec(any::<bool>(), 0..24)) {
            let layers: Vec<Layer> = kinds
                .iter()
                .enumerate()
                .map(|(i, is_text)| if *is_text { text(&format!("t{i}")) } else { shape(&format!("s{i}")) })
                .collect();
            let mut scene = MemoryScene::new();
            let mut reconciler = Reconciler::new();
            reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);

            let order = reconciler.paint_order_ids();
            prop_assert_eq!(order.len(), layers.len());
            let first_text = order.iter().position(|id| id.as_str().starts_with('t')).unwrap_or(order.len());
            prop_assert!(order[first_text..].iter().all(|id| id.as_str().starts_with('t')));

            let expected: Vec<LayerId> = text_last(&layers, |l| l.is_text())
                .into_iter()
                .map(|l| l.id.clone())
                .collect();
            prop_assert_eq!(&order, &expected);
            prop_assert_eq!(scene.paint_order_layers(), expected);

            let before = scene.stats();
            let report = reconciler.reconcile(&mut scene, &layers, GeometrySync::Preserve);
            prop_assert!(report.is_noop());
            prop_assert_eq!(scene.stats().reorders, before.reorders);
            prop_assert_eq!(scene.stats().created, before.created);
        }
    }
}
