//! Delimited (CSV) source reading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::ReaderBuilder;
use survey_model::{ColumnSpec, RecordTable, SentinelSet};
use tracing::info;

use crate::error::{IngestError, Result};
use crate::header::{canonical_headers, resolve_columns};
use crate::parse::build_row;
use crate::report::{ReadReport, RowIssueKind};
use crate::source::{ReadOutcome, SourceFormat};

/// Reads a comma-separated file whose first record is the header row.
pub fn read_delimited(
    path: &Path,
    columns: &[ColumnSpec],
    sentinels: &SentinelSet,
) -> Result<ReadOutcome> {
    read_delimited_with(path, columns, sentinels, b',')
}

/// Reads a delimited file with an explicit field separator.
pub fn read_delimited_with(
    path: &Path,
    columns: &[ColumnSpec],
    sentinels: &SentinelSet,
    delimiter: u8,
) -> Result<ReadOutcome> {
    let fields = columns.iter().map(ColumnSpec::field).collect();
    let mut table = RecordTable::new(fields)?;
    let mut report = ReadReport::new(path, SourceFormat::Csv);

    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(BufReader::new(file));
    let mut records = reader.records();

    let header = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(err)) => return Err(csv_error(path, err)),
        None => {
            return Err(IngestError::EmptySource {
                path: path.to_path_buf(),
            });
        }
    };
    let raw_headers: Vec<&str> = header.iter().collect();
    let headers = canonical_headers(&raw_headers);
    let indices = resolve_columns(path, &headers, columns)?;

    let mut record_number = 0usize;
    for result in records {
        record_number += 1;
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(csv_error(path, err)),
            Err(err) => {
                report.records_seen += 1;
                report.exclude(
                    record_number,
                    RowIssueKind::Malformed {
                        message: err.to_string(),
                    },
                );
                continue;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            report.blank_records += 1;
            continue;
        }
        report.records_seen += 1;
        if record.len() != headers.len() {
            report.exclude(
                record_number,
                RowIssueKind::FieldCount {
                    expected: headers.len(),
                    actual: record.len(),
                },
            );
            continue;
        }
        let raws = indices.iter().map(|&idx| &record[idx]);
        match build_row(columns, raws, sentinels) {
            Ok((row, hits)) => {
                table.push_row(row)?;
                report.keep(&hits);
            }
            Err(kind) => report.exclude(record_number, kind),
        }
    }

    info!(
        path = %path.display(),
        rows = report.rows_kept,
        excluded = report.excluded_count(),
        "delimited read complete"
    );
    Ok(ReadOutcome { table, report })
}

fn csv_error(path: &Path, err: csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
