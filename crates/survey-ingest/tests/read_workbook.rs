use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use survey_ingest::{IngestError, RowIssueKind, SourceDescriptor, SourceFormat, read_source};
use survey_model::{ColumnSpec, DataType, SentinelSet, Value};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Excel serial for 2000-06-15.
const BIRTH_SERIAL: &str = "36692";

enum Cell<'a> {
    Text(&'a str),
    Number(&'a str),
    /// Number stored with the built-in `mm-dd-yy` date style.
    Date(&'a str),
    Error(&'a str),
}

fn column_letter(idx: usize) -> char {
    (b'A' + u8::try_from(idx).unwrap()) as char
}

fn sheet_xml(rows: &[(usize, Vec<Cell<'_>>)]) -> String {
    let mut xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{MAIN_NS}"><sheetData>"#);
    for (number, cells) in rows {
        xml.push_str(&format!(r#"<row r="{number}">"#));
        for (idx, cell) in cells.iter().enumerate() {
            let reference = format!("{}{number}", column_letter(idx));
            let cell_xml = match cell {
                Cell::Text(text) => {
                    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
                }
                Cell::Number(value) => format!(r#"<c r="{reference}"><v>{value}</v></c>"#),
                Cell::Date(serial) => {
                    format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#)
                }
                Cell::Error(code) => format!(r#"<c r="{reference}" t="e"><v>{code}</v></c>"#),
            };
            xml.push_str(&cell_xml);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Writes a two-sheet workbook: "Wave 1" with mixed cells, "Wave 2" small.
fn write_waves(dir: &TempDir) -> PathBuf {
    let wave_one = sheet_xml(&[
        (
            1,
            vec![
                Cell::Text("Respondent ID"),
                Cell::Text("Birth Date"),
                Cell::Text("Weight (kg)"),
                Cell::Text("Smoker"),
            ],
        ),
        (
            2,
            vec![
                Cell::Number("1"),
                Cell::Date(BIRTH_SERIAL),
                Cell::Number("70.5"),
                Cell::Text("Yes"),
            ],
        ),
        (
            3,
            vec![
                Cell::Number("2"),
                Cell::Text("15/06/2000"),
                Cell::Number("998"),
                Cell::Text("No"),
            ],
        ),
        (
            4,
            vec![
                Cell::Number("3"),
                Cell::Date(BIRTH_SERIAL),
                Cell::Error("#DIV/0!"),
                Cell::Text("Yes"),
            ],
        ),
        (
            6,
            vec![
                Cell::Number("4"),
                Cell::Text("sometime"),
                Cell::Number("60"),
                Cell::Text("No"),
            ],
        ),
    ]);
    let wave_two = sheet_xml(&[
        (1, vec![Cell::Text("ID"), Cell::Text("Smoker")]),
        (2, vec![Cell::Number("10"), Cell::Text("No")]),
        (3, vec![Cell::Number("11"), Cell::Text("Yes")]),
    ]);
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="Wave 1" sheetId="1" r:id="rId1"/><sheet name="Wave 2" sheetId="2" r:id="rId2"/></sheets></workbook>"#
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{REL_NS}/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="{REL_NS}/styles" Target="styles.xml"/></Relationships>"#
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="{MAIN_NS}"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#
    );
    let package_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    );

    let path = dir.path().join("waves.xlsx");
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in [
        ("_rels/.rels", package_rels.as_str()),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
        ("xl/styles.xml", styles.as_str()),
        ("xl/worksheets/sheet1.xml", wave_one.as_str()),
        ("xl/worksheets/sheet2.xml", wave_two.as_str()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn wave_one_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id", DataType::Integer).with_header("respondent id"),
        ColumnSpec::new("birth", DataType::Date)
            .with_header("BIRTH DATE")
            .with_date_format("%d/%m/%Y"),
        ColumnSpec::new("weight_kg", DataType::Float).with_header("weight kg"),
        ColumnSpec::new("smoker", DataType::Text),
    ]
}

fn wave_two_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id", DataType::Integer),
        ColumnSpec::new("smoker", DataType::Text),
    ]
}

fn sentinels() -> SentinelSet {
    ["998", "999"].into_iter().collect()
}

#[test]
fn first_sheet_is_read_with_canonical_headers() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);
    let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_one_columns())
        .with_missing(sentinels());

    let outcome = read_source(&source).unwrap();
    let report = &outcome.report;
    assert_eq!(report.records_seen, 4);
    assert_eq!(report.blank_records, 1);
    assert_eq!(report.rows_kept, 2);
    assert_eq!(outcome.table.value(0, "id"), Some(&Value::Integer(1)));
    assert_eq!(outcome.table.value(1, "smoker"), Some(&Value::from("No")));
}

#[test]
fn native_date_cells_survive_a_declared_text_layout() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);
    let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_one_columns());

    let outcome = read_source(&source).unwrap();
    let birth = Value::Date(NaiveDate::from_ymd_opt(2000, 6, 15).unwrap());
    assert_eq!(outcome.table.value(0, "birth"), Some(&birth));
    assert_eq!(outcome.table.value(1, "birth"), Some(&birth));
    assert!(
        outcome
            .report
            .excluded
            .iter()
            .all(|issue| issue.record != 1 && issue.record != 2)
    );
}

#[test]
fn float_sentinel_cell_becomes_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);
    let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_one_columns())
        .with_missing(sentinels());

    let outcome = read_source(&source).unwrap();
    assert_eq!(outcome.table.value(0, "weight_kg"), Some(&Value::Float(70.5)));
    assert_eq!(outcome.table.value(1, "weight_kg"), Some(&Value::Missing));
    assert_eq!(outcome.report.sentinel_hits.get("weight_kg"), Some(&1));
}

#[test]
fn error_cells_and_bad_text_exclude_their_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);
    let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_one_columns())
        .with_missing(sentinels());

    let outcome = read_source(&source).unwrap();
    let excluded = &outcome.report.excluded;
    assert_eq!(excluded.len(), 2);
    assert_eq!(excluded[0].record, 3);
    assert!(matches!(
        excluded[0].kind,
        RowIssueKind::CellError { ref column, .. } if column == "weight_kg"
    ));
    assert_eq!(excluded[1].record, 5);
    assert!(matches!(
        excluded[1].kind,
        RowIssueKind::InvalidValue { ref column, .. } if column == "birth"
    ));
}

#[test]
fn sheet_is_selected_by_name_or_index() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);

    for sheet in ["Wave 2", "1"] {
        let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_two_columns())
            .with_sheet(sheet);
        let outcome = read_source(&source).unwrap();
        assert_eq!(outcome.table.height(), 2, "{sheet}");
        assert_eq!(outcome.table.value(0, "id"), Some(&Value::Integer(10)));
    }
}

#[test]
fn unknown_sheet_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);

    for sheet in ["Wave 9", "7"] {
        let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, wave_two_columns())
            .with_sheet(sheet);
        assert!(
            matches!(
                read_source(&source),
                Err(IngestError::SheetNotFound { sheet: ref name, .. }) if name == sheet
            ),
            "{sheet}"
        );
    }
}

#[test]
fn missing_sheet_header_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_waves(&dir);
    let mut columns = wave_two_columns();
    columns.push(ColumnSpec::new("height_cm", DataType::Float));
    let source = SourceDescriptor::new(&path, SourceFormat::Xlsx, columns).with_sheet("Wave 2");

    assert!(matches!(
        read_source(&source),
        Err(IngestError::MissingColumn { ref column, .. }) if column == "height_cm"
    ));
}
