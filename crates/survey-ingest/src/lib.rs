//! Survey source readers.
//!
//! Turns a fixed-width, CSV or spreadsheet file plus a column declaration
//! into a typed [`RecordTable`](survey_model::RecordTable).
//!
//! # Features
//!
//! - **Fixed-width**: byte-span slicing with per-field UTF-8 checks
//! - **Delimited / spreadsheet**: header lookup after canonicalization
//! - **Sentinels**: declared missing codes become `Value::Missing` before parsing
//! - **Diagnostics**: excluded records and sentinel hits in a [`ReadReport`]
//!
//! # Example
//!
//! ```ignore
//! use survey_ingest::{SourceDescriptor, SourceFormat, read_source};
//! use survey_model::{ColumnSpec, DataType};
//!
//! let columns = vec![
//!     ColumnSpec::new("id", DataType::Integer).with_span(1, 5),
//!     ColumnSpec::new("weight_kg", DataType::Float).with_span(6, 10),
//! ];
//! let source = SourceDescriptor::new("survey.dat", SourceFormat::FixedWidth, columns)
//!     .with_missing(["998", "999"].into_iter().collect());
//! let outcome = read_source(&source)?;
//! println!("{} rows, {} excluded", outcome.table.height(), outcome.report.excluded_count());
//! ```

mod delimited;
mod error;
mod fixed_width;
mod header;
mod parse;
mod report;
mod source;
mod workbook;

// === Error Types ===
pub use error::{IngestError, Result};

// === Readers ===
pub use delimited::{read_delimited, read_delimited_with};
pub use fixed_width::read_fixed_width;
pub use source::{ReadOutcome, SourceDescriptor, SourceFormat, read_source};
pub use workbook::read_workbook;

// === Parsing Helpers ===
pub use header::{canonical_header, canonical_headers};
pub use parse::{DEFAULT_DATE_FORMATS, ParsedCell, parse_cell, parse_date};

// === Diagnostics ===
pub use report::{ReadReport, RowIssue, RowIssueKind};
