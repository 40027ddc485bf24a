//! Selection-driven edits: nudge, duplicate, snap, lock, restack and delete.
//!
//! These operate on a [`DocumentState`] only. The session decides how each
//! outcome is committed to history and reflected on the scene.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::{ComposerError, ComposerResult, DocumentState, Layer, LayerId, Notice};

/// Default nudge distance in document units.
pub const DEFAULT_NUDGE_STEP: f32 = 1.0;

/// Default coarse (Shift) nudge distance.
pub const DEFAULT_COARSE_NUDGE_STEP: f32 = 10.0;

/// Default offset of a duplicate from its original, on both axes.
pub const DEFAULT_DUPLICATE_OFFSET: f32 = 20.0;

/// Direction of a keyboard nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgeDirection {
    /// Towards negative y.
    Up,
    /// Towards positive y.
    Down,
    /// Towards negative x.
    Left,
    /// Towards positive x.
    Right,
}

impl NudgeDirection {
    /// Displacement for a nudge of `amount`.
    #[must_use]
    pub fn delta(self, amount: f32) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -amount),
            Self::Down => (0.0, amount),
            Self::Left => (-amount, 0.0),
            Self::Right => (amount, 0.0),
        }
    }
}

/// Which edge or center of the document a layer snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapPosition {
    /// Center on both axes.
    Center,
    /// Left edges aligned.
    Left,
    /// Right edges aligned.
    Right,
    /// Top edges aligned.
    Top,
    /// Bottom edges aligned.
    Bottom,
}

/// Which way a layer moves in the stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackDirection {
    /// One step towards the front.
    Forward,
    /// One step towards the back.
    Backward,
}

/// Result of a selection-driven edit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditOutcome {
    /// Whether the document was mutated.
    pub changed: bool,
    /// Message for the user, if any.
    pub notice: Option<Notice>,
}

impl EditOutcome {
    const fn changed() -> Self {
        Self {
            changed: true,
            notice: None,
        }
    }

    const fn unchanged() -> Self {
        Self {
            changed: false,
            notice: None,
        }
    }

    const fn refused(notice: Notice) -> Self {
        Self {
            changed: false,
            notice: Some(notice),
        }
    }
}

/// Move the selected layer by `amount` in `direction`.
///
/// Nothing happens (with a notice) if no layer is selected or it is locked.
pub fn nudge(document: &mut DocumentState, direction: NudgeDirection, amount: f32) -> EditOutcome {
    let (dx, dy) = direction.delta(amount);
    nudge_by(document, dx, dy)
}

/// Move the selected layer by an arbitrary displacement.
pub fn nudge_by(document: &mut DocumentState, dx: f32, dy: f32) -> EditOutcome {
    let Some(id) = document.selected_layer_id.clone() else {
        return EditOutcome::refused(Notice::NothingSelected);
    };
    let Some(layer) = document.layer_mut(&id) else {
        return EditOutcome::refused(Notice::NothingSelected);
    };
    if layer.locked {
        return EditOutcome::refused(Notice::LayerLocked(id));
    }
    if !(dx.is_finite() && dy.is_finite()) || (dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON) {
        return EditOutcome::unchanged();
    }
    layer.x += dx;
    layer.y += dy;
    EditOutcome::changed()
}

/// Clone a layer under a fresh id, offset by `offset` on both axes, append it
/// and select it.
///
/// # Errors
///
/// Returns [`ComposerError::LayerNotFound`] if `id` names no layer.
pub fn duplicate(document: &mut DocumentState, id: &LayerId, offset: f32) -> ComposerResult<LayerId> {
    let original = document
        .layer(id)
        .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?
        .clone();
    insert_copy(document, &original, offset)
}

/// Insert a copy of `source` (typically a clipboard entry) under a fresh id,
/// offset by `offset` on both axes, and select it.
///
/// # Errors
///
/// Returns [`ComposerError::DuplicateLayerId`] if the new id is already used.
pub fn insert_copy(document: &mut DocumentState, source: &Layer, offset: f32) -> ComposerResult<LayerId> {
    let offset = effective_offset(offset);
    let mut copy = source.clone();
    copy.id = LayerId::new();
    while document.contains(&copy.id) {
        copy.id = LayerId::new();
    }
    copy.x += offset;
    copy.y += offset;

    let new_id = document.add_layer(copy)?;
    document.selected_layer_id = Some(new_id.clone());
    Ok(new_id)
}

/// `offset`, or the default when it is zero or not finite.
#[must_use]
pub fn effective_offset(offset: f32) -> f32 {
    if offset.is_finite() && offset.abs() > f32::EPSILON {
        offset
    } else {
        DEFAULT_DUPLICATE_OFFSET
    }
}

/// Move a layer one step forward or backward among the layers of its own
/// group. Text layers only trade places with text layers, everything else
/// with non-text layers, since text is always painted on top.
///
/// # Errors
///
/// Returns [`ComposerError::LayerNotFound`] if `id` names no layer.
pub fn restack(
    document: &mut DocumentState,
    id: &LayerId,
    direction: StackDirection,
) -> ComposerResult<EditOutcome> {
    let index = document
        .layers
        .iter()
        .position(|layer| &layer.id == id)
        .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
    let is_text = document.layers[index].is_text();
    let same_group = |layer: &Layer| layer.is_text() == is_text;

    let neighbour = match direction {
        StackDirection::Forward => document.layers[index + 1..]
            .iter()
            .position(same_group)
            .map(|offset| index + 1 + offset),
        StackDirection::Backward => document.layers[..index].iter().rposition(same_group),
    };
    let Some(other) = neighbour else {
        return Ok(EditOutcome::unchanged());
    };
    document.layers.swap(index, other);
    Ok(EditOutcome::changed())
}

/// Align the selected layer's rotated bounds with an edge or the center of
/// the document.
pub fn snap_to_position(document: &mut DocumentState, position: SnapPosition) -> EditOutcome {
    let Some(id) = document.selected_layer_id.clone() else {
        return EditOutcome::refused(Notice::NothingSelected);
    };
    let Some(bounds) = document.bounds() else {
        return EditOutcome::refused(Notice::MissingBounds);
    };
    let Some(layer) = document.layer_mut(&id) else {
        return EditOutcome::refused(Notice::NothingSelected);
    };
    if layer.locked {
        return EditOutcome::refused(Notice::LayerLocked(id));
    }

    let object = Rect::bounding(&layer.geometry());
    let (dx, dy) = match position {
        SnapPosition::Center => {
            let (cx, cy) = bounds.center();
            let (ox, oy) = object.center();
            (cx - ox, cy - oy)
        }
        SnapPosition::Left => (bounds.x - object.x, 0.0),
        SnapPosition::Right => (bounds.right() - object.right(), 0.0),
        SnapPosition::Top => (0.0, bounds.y - object.y),
        SnapPosition::Bottom => (0.0, bounds.bottom() - object.bottom()),
    };
    if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
        return EditOutcome::unchanged();
    }
    layer.x += dx;
    layer.y += dy;
    EditOutcome::changed()
}

/// Flip a layer's lock. Locking clears the selection; unlocking leaves it.
///
/// # Errors
///
/// Returns [`ComposerError::LayerNotFound`] if `id` names no layer.
pub fn toggle_lock(document: &mut DocumentState, id: &LayerId) -> ComposerResult<EditOutcome> {
    let layer = document
        .layer_mut(id)
        .ok_or_else(|| ComposerError::LayerNotFound(id.to_string()))?;
    layer.locked = !layer.locked;
    let notice = if layer.locked {
        document.selected_layer_id = None;
        Notice::Locked(id.clone())
    } else {
        Notice::Unlocked(id.clone())
    };
    Ok(EditOutcome {
        changed: true,
        notice: Some(notice),
    })
}

/// Remove the selected layer.
pub fn delete_selected(document: &mut DocumentState) -> EditOutcome {
    let Some(id) = document.selected_layer_id.clone() else {
        return EditOutcome::refused(Notice::NothingSelected);
    };
    match document.remove_layer(&id) {
        Ok(_) => EditOutcome::changed(),
        Err(_) => {
            document.selected_layer_id = None;
            EditOutcome::refused(Notice::NothingSelected)
        }
    }
}
