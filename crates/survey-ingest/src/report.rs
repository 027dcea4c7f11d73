//! Row-level diagnostics collected during a read.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::source::SourceFormat;

/// Why a record was excluded from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssueKind {
    /// Fixed-width line ends before the last declared byte position.
    TooShort { expected: usize, actual: usize },
    /// Delimited record has a different number of fields than the header.
    FieldCount { expected: usize, actual: usize },
    /// Field bytes are not valid UTF-8.
    Encoding { column: String },
    /// Value does not parse as the declared type and is not a sentinel.
    InvalidValue {
        column: String,
        expected: String,
        /// Never serialized; see [`RowIssueKind::raw`].
        #[serde(skip_serializing)]
        raw: String,
    },
    /// Spreadsheet error cell (`#DIV/0!`, `#N/A`, ...).
    CellError { column: String, message: String },
    /// The record itself could not be decoded.
    Malformed { message: String },
}

impl RowIssueKind {
    /// Raw source text involved in the issue, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            RowIssueKind::InvalidValue { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl fmt::Display for RowIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIssueKind::TooShort { expected, actual } => {
                write!(f, "line has {actual} bytes, expected at least {expected}")
            }
            RowIssueKind::FieldCount { expected, actual } => {
                write!(f, "record has {actual} fields, expected {expected}")
            }
            RowIssueKind::Encoding { column } => write!(f, "{column}: invalid UTF-8"),
            RowIssueKind::InvalidValue {
                column, expected, ..
            } => write!(f, "{column}: value is not a valid {expected}"),
            RowIssueKind::CellError { column, message } => write!(f, "{column}: {message}"),
            RowIssueKind::Malformed { message } => f.write_str(message),
        }
    }
}

/// An excluded record and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based record number in the source (line number for fixed-width,
    /// data row number after the header otherwise).
    pub record: usize,
    #[serde(flatten)]
    pub kind: RowIssueKind,
}

/// Diagnostic summary of one read.
#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    pub source: PathBuf,
    pub format: SourceFormat,
    /// Records encountered after the header, blank lines excluded.
    pub records_seen: usize,
    /// Records that made it into the table.
    pub rows_kept: usize,
    /// Empty lines or all-empty records that were skipped.
    pub blank_records: usize,
    pub excluded: Vec<RowIssue>,
    /// Sentinel matches per column, counted on kept rows only.
    pub sentinel_hits: BTreeMap<String, usize>,
}

impl ReadReport {
    pub fn new(source: &Path, format: SourceFormat) -> Self {
        Self {
            source: source.to_path_buf(),
            format,
            records_seen: 0,
            rows_kept: 0,
            blank_records: 0,
            excluded: Vec::new(),
            sentinel_hits: BTreeMap::new(),
        }
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty()
    }

    pub fn sentinel_total(&self) -> usize {
        self.sentinel_hits.values().sum()
    }

    pub(crate) fn exclude(&mut self, record: usize, kind: RowIssueKind) {
        tracing::warn!(record, issue = %kind, "row excluded");
        self.excluded.push(RowIssue { record, kind });
    }

    pub(crate) fn keep(&mut self, sentinel_columns: &[&str]) {
        self.rows_kept += 1;
        for column in sentinel_columns {
            *self.sentinel_hits.entry((*column).to_string()).or_default() += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_never_includes_raw_value() {
        let kind = RowIssueKind::InvalidValue {
            column: "weight".to_string(),
            expected: "float".to_string(),
            raw: "seventy".to_string(),
        };
        assert_eq!(kind.to_string(), "weight: value is not a valid float");
        assert_eq!(kind.raw(), Some("seventy"));
    }

    #[test]
    fn serialized_issue_omits_raw_value() {
        let issue = RowIssue {
            record: 4,
            kind: RowIssueKind::InvalidValue {
                column: "weight".to_string(),
                expected: "float".to_string(),
                raw: "seventy".to_string(),
            },
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "record": 4,
                "kind": "invalid_value",
                "column": "weight",
                "expected": "float",
            })
        );
    }

    #[test]
    fn keep_counts_sentinels_per_column() {
        let mut report = ReadReport::new(Path::new("x.dat"), SourceFormat::FixedWidth);
        report.keep(&["income", "income", "age"]);
        report.keep(&[]);
        assert_eq!(report.rows_kept, 2);
        assert_eq!(report.sentinel_hits.get("income"), Some(&2));
        assert_eq!(report.sentinel_total(), 3);
    }
}
