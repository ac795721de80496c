//! Error taxonomy for document loading and page-tree operations

use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Validation errors (`PageIndex`, `InvalidRange`, `EmptyInput`,
/// `AllPagesDeleted`, `OrderLength`) are detected before any output is
/// produced; no operation ever returns a partial result alongside them.
#[derive(Debug, Error)]
pub enum Error {
    /// Input bytes are not a well-formed PDF.
    #[error("failed to parse PDF: {0}")]
    Parse(#[from] lopdf::Error),

    /// The document is encrypted and encryption was not explicitly ignored.
    #[error("document is encrypted (load with ignore_encryption to proceed)")]
    Encrypted,

    /// The document parsed but its page tree is structurally unusable.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A page index fell outside `[0, page_count)`.
    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageIndex { index: usize, page_count: usize },

    /// A split range was malformed or out of bounds.
    #[error("invalid page range {range}: {reason}")]
    InvalidRange { range: String, reason: String },

    /// An operation was given no input documents.
    #[error("no input documents")]
    EmptyInput,

    /// Deleting the requested pages would leave an empty document.
    #[error("cannot delete all {page_count} pages")]
    AllPagesDeleted { page_count: usize },

    /// A reorder sequence did not cover the document.
    #[error("page order has {given} entries but document has {page_count} pages")]
    OrderLength { given: usize, page_count: usize },

    /// The render engine could not open a document for rasterization.
    #[error("failed to open document for rendering: {0}")]
    RenderOpen(String),

    /// Thumbnail rasterization failed for one page (1-indexed). Sibling
    /// pages of the same document are unaffected.
    #[error("failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// The compression engine failed, crashed, or was torn down early.
    #[error("compression failed: {0}")]
    Compression(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
