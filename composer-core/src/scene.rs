//! The boundary to the rendering library.
//!
//! The editor never draws anything itself. A [`SceneAdapter`] owns the live
//! visual objects and exposes the handful of capabilities the
//! [`Reconciler`](crate::Reconciler) needs. The document is always the source
//! of truth; the adapter's objects are a disposable cache keyed by layer id.
//!
//! ## Event flow
//!
//! ```text
//! session ──reconcile──▶ adapter (create / update / remove / reorder)
//! adapter ──SceneEvent──▶ session (moved / resized / rotated / selection)
//! ```

pub mod memory;

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

use crate::{FieldUpdate, Geometry, Layer, VisualProps};

pub use memory::{DecodedImage, MemoryScene, ObjectHandle, SceneStats};

/// Errors reported by a scene adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The layer's image source cannot be loaded.
    #[error("Image source unavailable: {0}")]
    SourceUnavailable(String),

    /// The adapter cannot build an object for this layer.
    #[error("Construction failed: {0}")]
    Construction(String),

    /// The handle does not name a live object.
    #[error("Unknown scene object: {0}")]
    UnknownObject(String),
}

/// Outcome of asking the adapter to build a visual object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construction<H> {
    /// The object exists and is on the scene.
    Ready(H),
    /// The object needs an asynchronously loaded asset first.
    Deferred,
}

/// Where a pointer gesture is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// The pointer is still down; more updates will follow.
    InProgress,
    /// The pointer was released.
    Finished,
}

/// Changes originating in the scene, fed back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent<H> {
    /// An object was dragged.
    ObjectMoved {
        /// The object.
        handle: H,
        /// Gesture phase.
        phase: GesturePhase,
    },
    /// An object was resized with its handles.
    ObjectResized {
        /// The object.
        handle: H,
        /// Gesture phase.
        phase: GesturePhase,
    },
    /// An object was rotated.
    ObjectRotated {
        /// The object.
        handle: H,
        /// Gesture phase.
        phase: GesturePhase,
    },
    /// The user selected an object, or cleared the selection.
    SelectionChanged(Option<H>),
}

impl<H: Copy> SceneEvent<H> {
    /// The object whose geometry changed, for geometry events.
    #[must_use]
    pub const fn geometry_target(&self) -> Option<(H, GesturePhase)> {
        match *self {
            Self::ObjectMoved { handle, phase }
            | Self::ObjectResized { handle, phase }
            | Self::ObjectRotated { handle, phase } => Some((handle, phase)),
            Self::SelectionChanged(_) => None,
        }
    }
}

/// Capabilities the editor needs from a rendering library.
pub trait SceneAdapter {
    /// Stable identifier of a live visual object.
    type Handle: Copy + Eq + Hash + Debug;

    /// A loaded resource (e.g. a decoded image) used to finish a deferred
    /// construction.
    type Asset;

    /// Build a visual object for `layer`, including its initial geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer cannot be represented (e.g. an unusable
    /// image source). The reconciler logs it and skips the layer.
    fn create_visual_object(
        &mut self,
        layer: &Layer,
    ) -> Result<Construction<Self::Handle>, SceneError>;

    /// Build a visual object for `layer` from a previously deferred asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be used for this layer.
    fn create_from_asset(
        &mut self,
        layer: &Layer,
        asset: Self::Asset,
    ) -> Result<Self::Handle, SceneError>;

    /// Apply one field change to a live object.
    fn update_visual_object_field(&mut self, handle: Self::Handle, update: &FieldUpdate);

    /// Remove a live object from the scene.
    fn remove_visual_object(&mut self, handle: Self::Handle);

    /// Restack live objects back-to-front.
    fn set_paint_order(&mut self, order: &[Self::Handle]);

    /// Allow or forbid drag, resize and rotate on an object.
    fn set_interaction_enabled(&mut self, handle: Self::Handle, enabled: bool);

    /// Current geometry of a live object.
    fn live_geometry(&self, handle: Self::Handle) -> Option<Geometry>;

    /// Current non-geometric visual state of a live object.
    fn visual_props(&self, handle: Self::Handle) -> Option<VisualProps>;

    /// Ask the rendering library to redraw.
    fn request_repaint(&mut self);
}
