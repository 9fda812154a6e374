use thiserror::Error;

/// Failures of the selection, materialization and splitting core.
///
/// A selection where only some pages were skipped is not an error; see
/// [`crate::split::ExtractionStatus::Partial`].
#[derive(Debug, Error)]
pub enum SplitError {
    /// The source could not be opened or parsed as a PDF
    #[error("Error processing PDF: {0}")]
    InvalidSourceDocument(String),

    /// The page specification parsed to zero page numbers
    #[error("Invalid page numbers format")]
    EmptySelection,

    /// Every requested page fell outside the document
    #[error("No valid pages to extract")]
    NoValidPages { skipped: Vec<i64> },

    /// A token was dropped while strict parsing was requested
    #[error("Invalid page token: '{0}'")]
    MalformedToken(String),

    #[error("Chunk size must be at least 1 (got {0})")]
    InvalidChunkSize(usize),

    /// Serializing an output document failed
    #[error("Failed to write PDF: {0}")]
    Write(String),

    #[error("Failed to build archive: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for SplitError {
    fn from(e: zip::result::ZipError) -> Self {
        SplitError::Archive(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
