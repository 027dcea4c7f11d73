//! Error types for record table construction and schema checks.

use thiserror::Error;

/// Errors raised when a table or column schema violates its invariants.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two fields share the same name.
    #[error("duplicate column '{name}'")]
    DuplicateColumn { name: String },

    /// A named column does not exist in the table.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },

    /// A row does not match the table width.
    #[error("row has {actual} cells but the table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    /// A column vector does not match the table height.
    #[error("column '{name}' has {actual} values but the table has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A row mask does not match the table height.
    #[error("row mask has {actual} entries but the table has {expected} rows")]
    MaskLength { expected: usize, actual: usize },

    /// A fixed-width span is empty, reversed or starts at zero.
    #[error("column '{name}': invalid byte span {start}-{end} (positions are 1-based and inclusive)")]
    InvalidSpan {
        name: String,
        start: usize,
        end: usize,
    },

    /// Only primitive types can be read straight from a source file.
    #[error("column '{name}': type {data_type} cannot be read from a source")]
    UnsupportedSourceType { name: String, data_type: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
