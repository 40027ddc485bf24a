//! An editing session: the document, its history and its live scene.
//!
//! Every committed edit follows the same path:
//!
//! ```text
//! mutate document ─▶ reconcile scene ─▶ commit to history ─▶ notify autosave
//! ```
//!
//! The session is single-writer. Hosts feed scene events in through
//! [`EditorSession::handle_scene_event`] and drain user-facing messages with
//! [`EditorSession::take_notices`].

use std::collections::HashSet;

use crate::autosave::AutosaveHandle;
use crate::history::{CommitMode, History, HistoryInfo};
use crate::reconcile::{ConstructionOutcome, GeometrySync, PendingConstruction, Reconciler};
use crate::scene::{GesturePhase, SceneAdapter, SceneError, SceneEvent};
use crate::selection::{self, EditOutcome, NudgeDirection, SnapPosition, StackDirection};
use crate::{ComposerError, ComposerResult, DocumentState, EditorConfig, Layer, LayerId, Notice};

/// Owns everything needed to edit one document.
pub struct EditorSession<S: SceneAdapter> {
    document: DocumentState,
    history: History<DocumentState>,
    reconciler: Reconciler<S::Handle>,
    scene: S,
    config: EditorConfig,
    autosave: Option<AutosaveHandle>,
    notices: Vec<Notice>,
    pending: Vec<PendingConstruction>,
    clipboard: Option<Layer>,
    /// Every layer id this session has seen. Ids are never handed out twice.
    used_ids: HashSet<LayerId>,
}

impl<S: SceneAdapter> EditorSession<S> {
    /// Start a session on an empty document from `config.canvas`.
    #[must_use]
    pub fn new(scene: S, config: EditorConfig) -> Self {
        let document = config.canvas.document();
        Self::with_document(scene, document, config)
    }

    /// Start a session on an existing document.
    #[must_use]
    pub fn with_document(scene: S, mut document: DocumentState, config: EditorConfig) -> Self {
        document.sanitize();
        let history = History::with_max_depth(document.clone(), config.history_depth);
        let used_ids = document.layers.iter().map(|layer| layer.id.clone()).collect();
        let mut session = Self {
            document,
            history,
            reconciler: Reconciler::new(),
            scene,
            config,
            autosave: None,
            notices: Vec::new(),
            pending: Vec::new(),
            clipboard: None,
            used_ids,
        };
        session.sync_scene(GeometrySync::Apply);
        session
    }

    /// Send every change to an autosave task.
    #[must_use]
    pub fn with_autosave(mut self, autosave: AutosaveHandle) -> Self {
        self.autosave = Some(autosave);
        self
    }

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// The scene adapter.
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the scene adapter, for hosts driving it directly.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Session settings.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The selected layer.
    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.document.selected_layer()
    }

    /// Live handle of a layer.
    #[must_use]
    pub fn handle_for(&self, id: &LayerId) -> Option<S::Handle> {
        self.reconciler.handle_for(id)
    }

    /// Layer ids back-to-front, as shown on the scene.
    #[must_use]
    pub fn paint_order(&self) -> Vec<LayerId> {
        self.reconciler.paint_order_ids()
    }

    /// Whether there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo/redo stack sizes.
    #[must_use]
    pub fn history_info(&self) -> HistoryInfo {
        self.history.info()
    }

    /// Drain messages for the user.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drain constructions waiting for an asset. The host loads each one and
    /// calls [`complete_construction`](Self::complete_construction) or
    /// [`fail_construction`](Self::fail_construction).
    pub fn take_pending_constructions(&mut self) -> Vec<PendingConstruction> {
        std::mem::take(&mut self.pending)
    }

    // -----------------------------------------------------------------------
    // Layer edits
    // -----------------------------------------------------------------------

    /// Append a layer and select it.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::DuplicateLayerId`] if the id is taken, or was
    /// used by a layer this session has since deleted.
    pub fn add_layer(&mut self, layer: Layer) -> ComposerResult<LayerId> {
        if self.used_ids.contains(&layer.id) {
            return Err(ComposerError::DuplicateLayerId(layer.id.to_string()));
        }
        let id = self.document.add_layer(layer)?;
        self.used_ids.insert(id.clone());
        self.document.selected_layer_id = Some(id.clone());
        self.commit(GeometrySync::Preserve);
        Ok(id)
    }

    /// Edit a layer in place. The id cannot be changed.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn update_layer(&mut self, id: &LayerId, edit: impl FnOnce(&mut Layer)) -> ComposerResult<()> {
        let layer = self
            .document
            .layer_mut(id)
            .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
        edit(layer);
        layer.id = id.clone();
        layer.normalize();
        self.commit(GeometrySync::Apply);
        Ok(())
    }

    /// Remove a layer.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn remove_layer(&mut self, id: &LayerId) -> ComposerResult<()> {
        self.document.remove_layer(id)?;
        self.commit(GeometrySync::Preserve);
        Ok(())
    }

    /// Remove the selected layer. Returns whether anything was removed.
    pub fn delete_selected(&mut self) -> bool {
        let outcome = selection::delete_selected(&mut self.document);
        self.finish(outcome, GeometrySync::Preserve)
    }

    /// Clone a layer with a fresh id, offset it and select the copy.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn duplicate(&mut self, id: &LayerId) -> ComposerResult<LayerId> {
        let copy = selection::duplicate(&mut self.document, id, self.config.duplicate_offset)?;
        self.used_ids.insert(copy.clone());
        self.commit(GeometrySync::Preserve);
        Ok(copy)
    }

    /// Copy the selected layer to the session clipboard. Returns `false`
    /// (with a notice) if nothing is selected.
    pub fn copy_selected(&mut self) -> bool {
        let Some(layer) = self.document.selected_layer().cloned() else {
            self.notify(Notice::NothingSelected);
            return false;
        };
        self.clipboard = Some(layer);
        true
    }

    /// Paste the clipboard as a new, selected layer with a fresh id.
    ///
    /// Each paste lands `duplicate_offset` further from the previous one.
    pub fn paste(&mut self) -> Option<LayerId> {
        let Some(source) = self.clipboard.as_mut() else {
            self.notify(Notice::ClipboardEmpty);
            return None;
        };
        let offset = selection::effective_offset(self.config.duplicate_offset);
        let pasted = match selection::insert_copy(&mut self.document, source, offset) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Paste failed: {e}");
                return None;
            }
        };
        source.x += offset;
        source.y += offset;
        self.used_ids.insert(pasted.clone());
        self.commit(GeometrySync::Preserve);
        Some(pasted)
    }

    /// Whether the clipboard holds a layer.
    #[must_use]
    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Move a layer one step towards the front, within its group.
    /// Returns whether the order changed.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn bring_forward(&mut self, id: &LayerId) -> ComposerResult<bool> {
        let outcome = selection::restack(&mut self.document, id, StackDirection::Forward)?;
        Ok(self.finish(outcome, GeometrySync::Preserve))
    }

    /// Move a layer one step towards the back, within its group.
    /// Returns whether the order changed.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn send_backward(&mut self, id: &LayerId) -> ComposerResult<bool> {
        let outcome = selection::restack(&mut self.document, id, StackDirection::Backward)?;
        Ok(self.finish(outcome, GeometrySync::Preserve))
    }

    /// Flip a layer's lock. Returns the new lock state.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if the layer does not exist.
    pub fn toggle_lock(&mut self, id: &LayerId) -> ComposerResult<bool> {
        let outcome = selection::toggle_lock(&mut self.document, id)?;
        self.finish(outcome, GeometrySync::Preserve);
        Ok(self.document.layer(id).is_some_and(|layer| layer.locked))
    }

    // -----------------------------------------------------------------------
    // Selection and movement
    // -----------------------------------------------------------------------

    /// Set or clear the selection. Does not create an undo step.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::LayerNotFound`] if `id` names no layer.
    pub fn select(&mut self, id: Option<&LayerId>) -> ComposerResult<()> {
        self.document.select(id)?;
        self.commit_silent();
        Ok(())
    }

    /// Select the topmost layer under a point, or clear the selection.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<LayerId> {
        let hit = self.document.layer_at(x, y).map(|layer| layer.id.clone());
        self.document.selected_layer_id.clone_from(&hit);
        self.commit_silent();
        hit
    }

    /// Nudge the selection by the configured step.
    pub fn nudge(&mut self, direction: NudgeDirection) -> bool {
        let outcome = selection::nudge(&mut self.document, direction, self.config.nudge_step);
        self.finish(outcome, GeometrySync::Apply)
    }

    /// Nudge the selection by the configured coarse step.
    pub fn nudge_coarse(&mut self, direction: NudgeDirection) -> bool {
        let step = self.config.coarse_nudge_step;
        let outcome = selection::nudge(&mut self.document, direction, step);
        self.finish(outcome, GeometrySync::Apply)
    }

    /// Move the selection by an arbitrary displacement.
    pub fn nudge_by(&mut self, dx: f32, dy: f32) -> bool {
        let outcome = selection::nudge_by(&mut self.document, dx, dy);
        self.finish(outcome, GeometrySync::Apply)
    }

    /// Align the selection with an edge or the center of the document.
    pub fn snap_to_position(&mut self, position: SnapPosition) -> bool {
        let outcome = selection::snap_to_position(&mut self.document, position);
        self.finish(outcome, GeometrySync::Apply)
    }

    // -----------------------------------------------------------------------
    // Document edits
    // -----------------------------------------------------------------------

    /// Change the background color.
    pub fn set_background(&mut self, color: impl Into<String>) {
        self.document.background_color = color.into();
        self.commit(GeometrySync::Preserve);
    }

    /// Change the document dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::InvalidOperation`] unless both dimensions are
    /// positive and finite.
    pub fn resize_document(&mut self, width: f32, height: f32) -> ComposerResult<()> {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !(usable(width) && usable(height)) {
            return Err(ComposerError::InvalidOperation(format!(
                "invalid document size {width}x{height}"
            )));
        }
        self.document.width = width;
        self.document.height = height;
        self.commit(GeometrySync::Preserve);
        Ok(())
    }

    /// Remove every layer.
    pub fn clear(&mut self) {
        self.document.clear();
        self.commit(GeometrySync::Preserve);
    }

    /// Replace the document and start a fresh history from it.
    pub fn load_document(&mut self, mut document: DocumentState) {
        document.sanitize();
        tracing::info!(layers = document.layer_count(), "Loading document");
        self.used_ids
            .extend(document.layers.iter().map(|layer| layer.id.clone()));
        self.history.reset(document.clone());
        self.document = document;
        self.sync_scene(GeometrySync::Apply);
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Step back. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(previous);
        true
    }

    /// Step forward. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(next);
        true
    }

    // -----------------------------------------------------------------------
    // Scene boundary
    // -----------------------------------------------------------------------

    /// Apply a change that happened on the scene.
    pub fn handle_scene_event(&mut self, event: SceneEvent<S::Handle>) {
        if let SceneEvent::SelectionChanged(handle) = event {
            let id = handle.and_then(|h| self.reconciler.layer_for_handle(h).cloned());
            if handle.is_some() && id.is_none() {
                tracing::debug!("Selection of unknown scene object {handle:?}");
                return;
            }
            self.document.selected_layer_id = id;
            self.commit_silent();
            return;
        }

        let Some((handle, phase)) = event.geometry_target() else {
            return;
        };
        let Some(id) = self.reconciler.layer_for_handle(handle).cloned() else {
            tracing::debug!("Geometry event for unknown scene object {handle:?}");
            return;
        };
        let Some(geometry) = self.scene.live_geometry(handle) else {
            return;
        };
        let Some(layer) = self.document.layer_mut(&id) else {
            return;
        };
        if layer.locked {
            tracing::debug!("Ignoring transform of locked layer {id}");
            self.sync_scene(GeometrySync::Apply);
            return;
        }
        let changed = layer.geometry() != geometry;
        if changed {
            layer.set_geometry(geometry);
        }
        let current = layer.geometry();
        match phase {
            GesturePhase::InProgress => {
                if changed {
                    self.commit_silent();
                }
            }
            GesturePhase::Finished => {
                // Compare with the last undo step, not `present`: in-progress
                // events have already been committed silently.
                let settled = self.history.checkpoint().layer(&id).map(Layer::geometry);
                if settled == Some(current) {
                    // A click without movement, or a drag back to its start.
                    if changed {
                        self.commit_silent();
                    }
                    return;
                }
                self.commit(GeometrySync::Preserve);
            }
        }
    }

    /// Finish a deferred construction with its loaded asset.
    pub fn complete_construction(
        &mut self,
        ticket: &PendingConstruction,
        asset: S::Asset,
    ) -> ConstructionOutcome<S::Handle> {
        self.pending.retain(|pending| pending.ticket != ticket.ticket);
        let outcome = self
            .reconciler
            .complete_construction(&mut self.scene, ticket, asset);
        if let ConstructionOutcome::Failed(error) = &outcome {
            self.notify(Notice::LayerSkipped {
                layer_id: ticket.layer_id.clone(),
                reason: error.to_string(),
            });
        }
        outcome
    }

    /// Record that loading the asset for a deferred construction failed.
    pub fn fail_construction(&mut self, ticket: &PendingConstruction, error: &SceneError) {
        self.pending.retain(|pending| pending.ticket != ticket.ticket);
        if self.reconciler.fail_construction(ticket, error) {
            self.notify(Notice::LayerSkipped {
                layer_id: ticket.layer_id.clone(),
                reason: error.to_string(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn finish(&mut self, outcome: EditOutcome, sync: GeometrySync) -> bool {
        if let Some(notice) = outcome.notice {
            self.notify(notice);
        }
        if outcome.changed {
            self.commit(sync);
        }
        outcome.changed
    }

    fn commit(&mut self, sync: GeometrySync) {
        self.sync_scene(sync);
        self.history.commit_with(self.document.clone(), CommitMode::Checkpoint);
        self.autosave_notify();
    }

    fn commit_silent(&mut self) {
        self.history.commit_with(self.document.clone(), CommitMode::Silent);
        self.autosave_notify();
    }

    fn restore(&mut self, state: DocumentState) {
        self.document = state;
        self.sync_scene(GeometrySync::Apply);
        self.autosave_notify();
    }

    fn sync_scene(&mut self, sync: GeometrySync) {
        let report = self
            .reconciler
            .reconcile(&mut self.scene, &self.document.layers, sync);
        for skipped in report.skipped {
            self.notify(Notice::LayerSkipped {
                layer_id: skipped.layer_id,
                reason: skipped.error.to_string(),
            });
        }
        self.pending.extend(report.deferred);
    }

    fn autosave_notify(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify(&self.document);
        }
    }

    fn notify(&mut self, notice: Notice) {
        tracing::info!("{notice}");
        self.notices.push(notice);
    }
}
