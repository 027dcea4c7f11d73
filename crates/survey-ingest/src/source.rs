//! Source descriptors and format dispatch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use survey_model::{ColumnSpec, RecordTable, SentinelSet, validate_schema};
use tracing::info_span;

use crate::delimited::read_delimited;
use crate::error::Result;
use crate::fixed_width::read_fixed_width;
use crate::report::ReadReport;
use crate::workbook::read_workbook;

/// Physical layout of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    FixedWidth,
    Csv,
    #[serde(alias = "xls", alias = "ods", alias = "workbook")]
    Xlsx,
}

impl SourceFormat {
    /// Infers the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Xlsx),
            "dat" | "txt" | "fwf" => Some(Self::FixedWidth),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedWidth => "fixed-width",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Everything needed to read one source.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub columns: Vec<ColumnSpec>,
    pub missing: SentinelSet,
    /// Worksheet name or 0-based index, spreadsheets only.
    pub sheet: Option<String>,
}

impl SourceDescriptor {
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat, columns: Vec<ColumnSpec>) -> Self {
        Self {
            path: path.into(),
            format,
            columns,
            missing: SentinelSet::new(),
            sheet: None,
        }
    }

    #[must_use]
    pub fn with_missing(mut self, missing: SentinelSet) -> Self {
        self.missing = missing;
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// A typed table plus the diagnostics gathered while building it.
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub table: RecordTable,
    pub report: ReadReport,
}

/// Reads a source into a typed table.
///
/// Schema problems and unreadable files are fatal. Records that fail to
/// parse are excluded and listed in the returned report.
pub fn read_source(source: &SourceDescriptor) -> Result<ReadOutcome> {
    let _span = info_span!(
        "read_source",
        path = %source.path.display(),
        format = source.format.as_str()
    )
    .entered();
    validate_schema(&source.columns)?;
    match source.format {
        SourceFormat::FixedWidth => read_fixed_width(&source.path, &source.columns, &source.missing),
        SourceFormat::Csv => read_delimited(&source.path, &source.columns, &source.missing),
        SourceFormat::Xlsx => read_workbook(
            &source.path,
            &source.columns,
            &source.missing,
            source.sheet.as_deref(),
        ),
    }
}
