//! # Composer Export
//!
//! Renders composer documents to SVG, PNG and JPEG.
//!
//! Layers are drawn in the same back-to-front order the editor shows them:
//! every non-text layer first, then text on top.
//!
//! ```text
//! DocumentState ─▶ SVG ─▶ usvg tree ─▶ tiny-skia pixmap ─▶ PNG / JPEG
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;

pub use error::{ExportError, ExportResult};
pub use export::{
    export_file_name, parse_hex_color, DocumentExporter, ExportFormat, ExportOptions,
    DEFAULT_QUALITY,
};
