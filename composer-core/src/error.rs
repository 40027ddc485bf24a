//! Error types for editing operations.

use thiserror::Error;

/// Result type for editing operations.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Errors that can occur while editing a document.
///
/// These are caller mistakes or malformed input. Conditions the user should
/// merely be told about (empty selection, locked layer) are reported as
/// [`Notice`](crate::Notice) values instead.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Layer not found in the document.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// A layer with this id already exists in the document.
    #[error("Duplicate layer id: {0}")]
    DuplicateLayerId(String),

    /// Invalid operation on the document.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Config(#[from] std::io::Error),
}
