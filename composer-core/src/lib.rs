//! # Composer Core
//!
//! Editing logic for a layered image and text composition editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├──────────────────────┬──────────────────────┤
//! │  Selection           │  History             │
//! │  - nudge / snap      │  - bounded undo      │
//! │  - duplicate / lock  │  - silent commits    │
//! ├──────────────────────┼──────────────────────┤
//! │  Reconciler          │  Autosave            │
//! │  - diff and patch    │  - debounce          │
//! │  - text-last order   │  - periodic backup   │
//! ├──────────────────────┴──────────────────────┤
//! │  SceneAdapter (rendering library boundary)  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod autosave;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod notice;
pub mod persist;
pub mod reconcile;
pub mod scene;
pub mod selection;
pub mod session;

pub use autosave::{AutosaveBridge, AutosaveHandle, SaveStatus};
pub use config::{AutosaveConfig, CanvasDefaults, EditorConfig};
pub use document::DocumentState;
pub use error::{ComposerError, ComposerResult};
pub use geometry::Rect;
pub use history::{CommitMode, History, HistoryInfo};
pub use layer::{
    FieldUpdate, FontStyle, Geometry, ImageContent, Layer, LayerId, LayerKind, LayerType,
    ShapeKind, ShapeStyle, StylePatch, TextAlign, TextStyle, VisualProps,
};
pub use notice::Notice;
pub use persist::{DocumentStore, FileStore, MemoryStore, PersistError};
pub use reconcile::{
    ConstructionOutcome, GeometrySync, PendingConstruction, ReconcileReport, Reconciler,
    SkippedLayer,
};
pub use scene::{Construction, GesturePhase, SceneAdapter, SceneError, SceneEvent};
pub use selection::{EditOutcome, NudgeDirection, SnapPosition, StackDirection};
pub use session::EditorSession;

/// Composer core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
