use thiserror::Error;

use crate::ImageRecord;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("failed to extract text from page {page}: {message}")]
    TextError { page: usize, message: String },
    #[error("failed to extract images from page {page}: {message}")]
    ImageError { page: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document access backends.
///
/// Implementors expose the document page by page; classification,
/// correlation and export live in [`crate::pipeline`]. Pages are
/// 0-based.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> Result<usize, SourceError>;

    /// Embedded raster images of `page`, in enumeration order.
    ///
    /// Returned records carry their 1-based position in `index`.
    fn page_images(&self, page: usize) -> Result<Vec<ImageRecord>, SourceError>;

    /// Plain text of `page`.
    fn page_text(&self, page: usize) -> Result<String, SourceError>;
}
