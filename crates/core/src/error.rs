//! Error taxonomy for editor operations
//!
//! Every failure is handled at the session boundary where it occurs: the
//! scene graph and history are left untouched and the failure is reported
//! through the returned error and a notification.

use pdf_engine::PdfEngineError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Bad or corrupt input file
    #[error("failed to load document: {0}")]
    Load(String),

    /// The PDF engine rejected a page; the previous page view is kept
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// Missing or malformed user input
    #[error("{0}")]
    Validation(String),

    #[error("no document is loaded")]
    NoDocument,

    #[error("scene serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("export failed: {0}")]
    Export(String),
}

impl EditorError {
    pub(crate) fn render(page: u32, source: PdfEngineError) -> Self {
        EditorError::Render { page, reason: source.to_string() }
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
