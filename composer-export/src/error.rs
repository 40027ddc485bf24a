//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while exporting a document.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export options cannot be honored.
    #[error("Invalid export options: {0}")]
    InvalidOptions(String),

    /// The intermediate SVG could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// The raster target could not be allocated.
    #[error("Failed to create a {0}x{1} pixmap")]
    Pixmap(u32, u32),

    /// The image encoder failed.
    #[error("{format} encoding failed: {reason}")]
    Encode {
        /// Output format.
        format: &'static str,
        /// Encoder message.
        reason: String,
    },
}
