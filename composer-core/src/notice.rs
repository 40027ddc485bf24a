//! Non-fatal, user-facing messages.

use std::fmt;

use crate::LayerId;

/// Something the user should be told about. Never an error: the operation
/// that produced it simply did nothing, or did exactly what was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The operation needs a selected layer.
    NothingSelected,
    /// The document has no usable bounds to align against.
    MissingBounds,
    /// The selected layer is locked and cannot be moved.
    LayerLocked(LayerId),
    /// A layer was locked.
    Locked(LayerId),
    /// A layer was unlocked.
    Unlocked(LayerId),
    /// Paste was requested with nothing copied.
    ClipboardEmpty,
    /// A layer could not be shown.
    LayerSkipped {
        /// The layer.
        layer_id: LayerId,
        /// Why it could not be shown.
        reason: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingSelected => f.write_str("Please select a layer first"),
            Self::MissingBounds => f.write_str("Canvas bounds are not available"),
            Self::LayerLocked(_) => f.write_str("Layer is locked"),
            Self::Locked(_) => f.write_str("Layer locked"),
            Self::Unlocked(_) => f.write_str("Layer unlocked"),
            Self::ClipboardEmpty => f.write_str("Nothing to paste"),
            Self::LayerSkipped { reason, .. } => write!(f, "Could not display layer: {reason}"),
        }
    }
}
