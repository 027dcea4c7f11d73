//! Error types for source reading.
//!
//! Every variant here is fatal for a read: no partial table is returned.
//! Problems confined to a single record are reported through
//! [`RowIssue`](crate::RowIssue) instead.

use std::path::PathBuf;

use survey_model::ModelError;
use thiserror::Error;

/// Errors that abort a source read.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source file does not exist.
    #[error("source file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to open or read the source file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// The CSV reader failed outside of a single record.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// The spreadsheet could not be opened or decoded.
    #[error("failed to open workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Requested worksheet does not exist.
    #[error("worksheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// No header row could be read.
    #[error("source has no header row: {path}")]
    EmptySource { path: PathBuf },

    // === Schema Errors ===
    /// A declared header is absent from the file.
    #[error("column '{column}' (header '{header}') not found in {path}")]
    MissingColumn {
        column: String,
        header: String,
        path: PathBuf,
    },

    /// A fixed-width column was declared without a byte span.
    #[error("column '{column}' has no byte span; fixed-width sources need one per column")]
    MissingSpan { column: String },

    /// Column declarations are inconsistent.
    #[error(transparent)]
    Schema(#[from] ModelError),
}

impl IngestError {
    /// Maps an I/O error on `path`, separating a missing file from other failures.
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
