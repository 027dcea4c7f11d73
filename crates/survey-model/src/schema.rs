//! Column types and source schema declarations.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Declared type of a column.
///
/// Only the four primitive types can be read from a source file;
/// `Categorical` columns are produced by normalization or bucketing and carry
/// their level order explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Float,
    Text,
    Date,
    Categorical { levels: Vec<String> },
}

impl DataType {
    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataType::Categorical { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Declared levels of a categorical column.
    pub fn levels(&self) -> Option<&[String]> {
        match self {
            DataType::Categorical { levels } => Some(levels),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Categorical { .. } => "categorical",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed column of a record table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Fixed-width field position, 1-based and inclusive on both ends.
///
/// A codebook entry "positions 12-14" is `ByteSpan { start: 12, end: 14 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

impl ByteSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_valid(self) -> bool {
        self.start >= 1 && self.start <= self.end
    }

    /// Zero-based, half-open byte range of this span.
    pub fn range(self) -> std::ops::Range<usize> {
        (self.start - 1)..self.end
    }

    pub fn width(self) -> usize {
        self.end + 1 - self.start
    }
}

/// Declaration of one source column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    /// Name of the column in the resulting table.
    pub name: String,

    /// Primitive type the raw text is parsed into.
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// Byte positions, required for fixed-width sources.
    #[serde(default)]
    pub span: Option<ByteSpan>,

    /// Spreadsheet header to read from; defaults to `name`.
    #[serde(default)]
    pub header: Option<String>,

    /// chrono format string for date columns.
    #[serde(default)]
    pub date_format: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            span: None,
            header: None,
            date_format: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(ByteSpan::new(start, end));
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Header used for spreadsheet lookup.
    pub fn header_name(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.name)
    }

    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.data_type.is_primitive() {
            return Err(ModelError::UnsupportedSourceType {
                name: self.name.clone(),
                data_type: self.data_type.to_string(),
            });
        }
        if let Some(span) = self.span
            && !span.is_valid()
        {
            return Err(ModelError::InvalidSpan {
                name: self.name.clone(),
                start: span.start,
                end: span.end,
            });
        }
        Ok(())
    }
}

/// Checks every column declaration and rejects duplicate names.
pub fn validate_schema(columns: &[ColumnSpec]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for column in columns {
        column.validate()?;
        if !seen.insert(column.name.as_str()) {
            return Err(ModelError::DuplicateColumn {
                name: column.name.clone(),
            });
        }
    }
    Ok(())
}
