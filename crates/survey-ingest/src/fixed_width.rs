//! Fixed-width record reading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use survey_model::{ByteSpan, ColumnSpec, RecordTable, SentinelSet};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::parse::build_row;
use crate::report::{ReadReport, RowIssueKind};
use crate::source::{ReadOutcome, SourceFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads a fixed-width file where each column occupies a declared byte span.
///
/// Lines are handled as raw bytes so a non-UTF-8 byte only fails the field
/// that contains it. A line shorter than the largest declared end position is
/// excluded and counted.
pub fn read_fixed_width(
    path: &Path,
    columns: &[ColumnSpec],
    sentinels: &SentinelSet,
) -> Result<ReadOutcome> {
    let spans = column_spans(columns)?;
    let min_len = spans.iter().map(|span| span.end).max().unwrap_or(0);
    let fields = columns.iter().map(ColumnSpec::field).collect();
    let mut table = RecordTable::new(fields)?;
    let mut report = ReadReport::new(path, SourceFormat::FixedWidth);

    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    let mut line_number = 0usize;
    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| IngestError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_number += 1;
        let mut line = strip_line_ending(&buffer);
        if line_number == 1 {
            line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
        }
        if line.is_empty() {
            report.blank_records += 1;
            continue;
        }
        report.records_seen += 1;
        if line.len() < min_len {
            report.exclude(
                line_number,
                RowIssueKind::TooShort {
                    expected: min_len,
                    actual: line.len(),
                },
            );
            continue;
        }
        let raws = match slice_fields(line, columns, &spans) {
            Ok(raws) => raws,
            Err(kind) => {
                report.exclude(line_number, kind);
                continue;
            }
        };
        match build_row(columns, raws.iter().copied(), sentinels) {
            Ok((row, hits)) => {
                table.push_row(row)?;
                report.keep(&hits);
            }
            Err(kind) => report.exclude(line_number, kind),
        }
    }

    info!(
        path = %path.display(),
        rows = report.rows_kept,
        excluded = report.excluded_count(),
        "fixed-width read complete"
    );
    Ok(ReadOutcome { table, report })
}

fn column_spans(columns: &[ColumnSpec]) -> Result<Vec<ByteSpan>> {
    columns
        .iter()
        .map(|column| {
            column.span.ok_or_else(|| IngestError::MissingSpan {
                column: column.name.clone(),
            })
        })
        .collect()
}

fn strip_line_ending(buffer: &[u8]) -> &[u8] {
    let line = buffer.strip_suffix(b"\n").unwrap_or(buffer);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn slice_fields<'l>(
    line: &'l [u8],
    columns: &[ColumnSpec],
    spans: &[ByteSpan],
) -> std::result::Result<Vec<&'l str>, RowIssueKind> {
    let mut raws = Vec::with_capacity(spans.len());
    for (column, span) in columns.iter().zip(spans) {
        let bytes = &line[span.range()];
        match std::str::from_utf8(bytes) {
            Ok(raw) => raws.push(raw),
            Err(_) => {
                debug!(column = %column.name, "field is not valid UTF-8");
                return Err(RowIssueKind::Encoding {
                    column: column.name.clone(),
                });
            }
        }
    }
    Ok(raws)
}
