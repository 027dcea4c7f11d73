//! Error types for table transformations.

use survey_model::ModelError;
use thiserror::Error;

/// Errors that abort a normalization or derivation pass.
///
/// Per-cell problems (an unmapped code, a missing operand) never surface
/// here; they become missing values and are counted in the pass report.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransformError {
    /// A rule or derivation names a column the table does not have.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A derived column would overwrite an existing one.
    #[error("column already exists: {0}")]
    DuplicateColumn(String),

    /// A declared level list omits a label the mapping produces.
    #[error("categorical rule for '{column}' maps to '{label}', which is not a declared level")]
    UnknownLevel { column: String, label: String },

    /// A binary rule accepts the same spelling for yes and for no.
    #[error("binary rule for '{column}' treats '{spelling}' as both yes and no")]
    AmbiguousSpelling { column: String, spelling: String },

    /// Bucket upper bounds are not finite and strictly increasing.
    #[error("bucket bounds for '{name}' must be finite and strictly increasing")]
    InvalidBounds { name: String },

    /// Table structure error.
    #[error(transparent)]
    Model(ModelError),

    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl From<ModelError> for TransformError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ColumnNotFound { name } => Self::ColumnNotFound(name),
            ModelError::DuplicateColumn { name } => Self::DuplicateColumn(name),
            other => Self::Model(other),
        }
    }
}

/// Result type for transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;
