//! Spreadsheet (xlsx, xls, ods) source reading.

use std::path::Path;

use calamine::{Data, DataType as _, Range, Reader, open_workbook_auto};
use chrono::NaiveDate;
use survey_model::{
    ColumnSpec, DATE_FORMAT, DataType, RecordTable, SentinelSet, Value, format_numeric,
};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::header::{canonical_headers, resolve_columns};
use crate::parse::{ParsedCell, parse_cell};
use crate::report::{ReadReport, RowIssueKind};
use crate::source::{ReadOutcome, SourceFormat};

/// Reads one worksheet whose first row is the header row.
///
/// `sheet` selects a worksheet by name, or by 0-based index when it is a
/// number that is not also a sheet name. The first sheet is used otherwise.
pub fn read_workbook(
    path: &Path,
    columns: &[ColumnSpec],
    sentinels: &SentinelSet,
    sheet: Option<&str>,
) -> Result<ReadOutcome> {
    if let Err(err) = std::fs::metadata(path) {
        return Err(IngestError::io(path, err));
    }
    let range = load_range(path, sheet)?;
    let fields = columns.iter().map(ColumnSpec::field).collect();
    let mut table = RecordTable::new(fields)?;
    let mut report = ReadReport::new(path, SourceFormat::Xlsx);

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(IngestError::EmptySource {
            path: path.to_path_buf(),
        });
    };
    let raw_headers: Vec<String> = header_row
        .iter()
        .map(|cell| sheet_cell(cell).map(SheetCell::into_text).unwrap_or_default())
        .collect();
    let headers = canonical_headers(&raw_headers);
    let indices = resolve_columns(path, &headers, columns)?;

    for (offset, cells) in rows.enumerate() {
        let record_number = offset + 1;
        if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
            report.blank_records += 1;
            continue;
        }
        report.records_seen += 1;
        let parsed = row_cells(cells, columns, &indices)
            .and_then(|sheet_cells| build_sheet_row(columns, sheet_cells, sentinels));
        match parsed {
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
        "workbook read complete"
    );
    Ok(ReadOutcome { table, report })
}

fn load_range(path: &Path, sheet: Option<&str>) -> Result<Range<Data>> {
    let workbook_error = |message: String| IngestError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) if names.iter().any(|n| n == wanted) => wanted.to_string(),
        Some(wanted) => wanted
            .parse::<usize>()
            .ok()
            .and_then(|idx| names.get(idx).cloned())
            .ok_or_else(|| IngestError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => names.first().cloned().ok_or_else(|| IngestError::EmptySource {
            path: path.to_path_buf(),
        })?,
    };
    debug!(sheet = %name, "reading worksheet");
    workbook
        .worksheet_range(&name)
        .map_err(|e| workbook_error(e.to_string()))
}

/// A worksheet cell after error handling, before typed parsing.
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Text(String),
    /// A cell the workbook itself stores as a date.
    Date(NaiveDate),
}

impl SheetCell {
    fn into_text(self) -> String {
        match self {
            SheetCell::Text(text) => text,
            SheetCell::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }
}

fn row_cells(
    cells: &[Data],
    columns: &[ColumnSpec],
    indices: &[usize],
) -> std::result::Result<Vec<SheetCell>, RowIssueKind> {
    columns
        .iter()
        .zip(indices)
        .map(|(column, &idx)| {
            let Some(cell) = cells.get(idx) else {
                return Ok(SheetCell::Text(String::new()));
            };
            sheet_cell(cell).map_err(|message| RowIssueKind::CellError {
                column: column.name.clone(),
                message,
            })
        })
        .collect()
}

/// Converts one record's cells into a row.
///
/// Native date cells go straight into date columns; every other cell is
/// parsed from text like a delimited field, sentinel check included.
fn build_sheet_row<'a>(
    columns: &'a [ColumnSpec],
    cells: Vec<SheetCell>,
    sentinels: &SentinelSet,
) -> std::result::Result<(Vec<Value>, Vec<&'a str>), RowIssueKind> {
    let mut row = Vec::with_capacity(columns.len());
    let mut hits = Vec::new();
    for (spec, cell) in columns.iter().zip(cells) {
        let parsed = match cell {
            SheetCell::Date(date) if spec.data_type == DataType::Date => ParsedCell {
                value: Value::Date(date),
                sentinel: false,
            },
            other => parse_cell(spec, &other.into_text(), sentinels)?,
        };
        if parsed.sentinel {
            hits.push(spec.name.as_str());
        }
        row.push(parsed.value);
    }
    Ok((row, hits))
}

/// Reads a spreadsheet cell; error cells yield their message.
fn sheet_cell(cell: &Data) -> std::result::Result<SheetCell, String> {
    match cell {
        Data::Empty => Ok(SheetCell::Text(String::new())),
        Data::String(s) | Data::DurationIso(s) => Ok(SheetCell::Text(s.clone())),
        Data::Int(v) => Ok(SheetCell::Text(v.to_string())),
        Data::Float(v) => Ok(SheetCell::Text(format_numeric(*v))),
        Data::Bool(v) => Ok(SheetCell::Text(v.to_string())),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|value| SheetCell::Date(value.date()))
            .ok_or_else(|| "date serial out of range".to_string()),
        Data::DateTimeIso(s) => Ok(iso_date(s)
            .map_or_else(|| SheetCell::Text(s.clone()), SheetCell::Date)),
        Data::Error(err) => Err(format!("spreadsheet error {err:?}")),
    }
}

fn iso_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(cell: &Data) -> String {
        sheet_cell(cell).unwrap().into_text()
    }

    #[test]
    fn sheet_cell_matches_delimited_rendering() {
        assert_eq!(text(&Data::Float(998.0)), "998");
        assert_eq!(text(&Data::Float(70.25)), "70.25");
        assert_eq!(text(&Data::Int(3)), "3");
        assert_eq!(text(&Data::String("Yes".into())), "Yes");
        assert_eq!(text(&Data::Empty), "");
    }

    #[test]
    fn iso_datetime_keeps_date_part() {
        assert_eq!(
            sheet_cell(&Data::DateTimeIso("2020-06-14T00:00:00".into())).unwrap(),
            SheetCell::Date(NaiveDate::from_ymd_opt(2020, 6, 14).unwrap())
        );
        assert_eq!(
            sheet_cell(&Data::DateTimeIso("not a date".into())).unwrap(),
            SheetCell::Text("not a date".into())
        );
    }

    #[test]
    fn native_date_ignores_declared_text_layout() {
        let columns = vec![
            ColumnSpec::new("birth", DataType::Date).with_date_format("%d/%m/%Y"),
            ColumnSpec::new("note", DataType::Text),
        ];
        let date = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        let (row, hits) = build_sheet_row(
            &columns,
            vec![SheetCell::Date(date), SheetCell::Date(date)],
            &SentinelSet::new(),
        )
        .unwrap();
        assert_eq!(row, vec![Value::Date(date), Value::from("2000-06-15")]);
        assert!(hits.is_empty());

        let (row, _) = build_sheet_row(
            &columns,
            vec![SheetCell::Text("15/06/2000".into()), SheetCell::Text(String::new())],
            &SentinelSet::new(),
        )
        .unwrap();
        assert_eq!(row[0], Value::Date(date));
    }

    #[test]
    fn error_cells_fail_the_row() {
        let cells = vec![Data::Error(calamine::CellErrorType::Div0)];
        let columns = vec![ColumnSpec::new("bmi", DataType::Float)];
        let err = row_cells(&cells, &columns, &[0]).unwrap_err();
        assert!(matches!(err, RowIssueKind::CellError { .. }));
    }
}
