//! Raw text to typed value conversion.

use chrono::NaiveDate;
use survey_model::{ColumnSpec, DataType, SentinelSet, Value, parse_f64, parse_i64};

use crate::report::RowIssueKind;

/// Date layouts tried when a column declares no `date_format`.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Outcome of converting one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCell {
    pub value: Value,
    /// True when the raw text matched a declared sentinel.
    pub sentinel: bool,
}

/// Converts raw cell text according to its column declaration.
///
/// Sentinels are checked on the trimmed raw text before any type coercion,
/// so a sentinel is never parsed as real data.
pub fn parse_cell(
    spec: &ColumnSpec,
    raw: &str,
    sentinels: &SentinelSet,
) -> Result<ParsedCell, RowIssueKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(ParsedCell {
            value: Value::Missing,
            sentinel: false,
        });
    }
    if sentinels.contains(trimmed) {
        return Ok(ParsedCell {
            value: Value::Missing,
            sentinel: true,
        });
    }
    let value = match &spec.data_type {
        DataType::Integer => parse_i64(trimmed).map(Value::Integer),
        DataType::Float => parse_f64(trimmed).map(Value::Float),
        DataType::Text => Some(Value::Text(trimmed.to_string())),
        DataType::Date => parse_date(trimmed, spec.date_format.as_deref()).map(Value::Date),
        DataType::Categorical { .. } => None,
    };
    value
        .map(|value| ParsedCell {
            value,
            sentinel: false,
        })
        .ok_or_else(|| RowIssueKind::InvalidValue {
            column: spec.name.clone(),
            expected: spec.data_type.name().to_string(),
            raw: trimmed.to_string(),
        })
}

/// Parses a calendar date with an explicit format or the default layouts.
pub fn parse_date(value: &str, format: Option<&str>) -> Option<NaiveDate> {
    match format {
        Some(format) => NaiveDate::parse_from_str(value, format).ok(),
        None => DEFAULT_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok()),
    }
}

/// Converts one record's raw cells into a row.
///
/// Returns the row and the names of the columns whose cell was a sentinel.
pub(crate) fn build_row<'a, 'r>(
    columns: &'a [ColumnSpec],
    raws: impl IntoIterator<Item = &'r str>,
    sentinels: &SentinelSet,
) -> Result<(Vec<Value>, Vec<&'a str>), RowIssueKind> {
    let mut row = Vec::with_capacity(columns.len());
    let mut hits = Vec::new();
    for (spec, raw) in columns.iter().zip(raws) {
        let parsed = parse_cell(spec, raw, sentinels)?;
        if parsed.sentinel {
            hits.push(spec.name.as_str());
        }
        row.push(parsed.value);
    }
    Ok((row, hits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinels() -> SentinelSet {
        ["998", "999", "Refused"].into_iter().collect()
    }

    #[test]
    fn sentinel_wins_over_type() {
        let spec = ColumnSpec::new("weight", DataType::Float);
        let parsed = parse_cell(&spec, " 999 ", &sentinels()).unwrap();
        assert_eq!(parsed.value, Value::Missing);
        assert!(parsed.sentinel);

        let spec = ColumnSpec::new("smoker", DataType::Text);
        let parsed = parse_cell(&spec, "Refused", &sentinels()).unwrap();
        assert_eq!(parsed.value, Value::Missing);
    }

    #[test]
    fn invalid_numeric_is_row_issue() {
        let spec = ColumnSpec::new("weight", DataType::Float);
        let err = parse_cell(&spec, "heavy", &sentinels()).unwrap_err();
        assert!(matches!(err, RowIssueKind::InvalidValue { ref column, .. } if column == "weight"));
    }

    #[test]
    fn integer_rejects_fraction() {
        let spec = ColumnSpec::new("age", DataType::Integer);
        assert!(parse_cell(&spec, "40.5", &sentinels()).is_err());
        assert_eq!(
            parse_cell(&spec, "040", &sentinels()).unwrap().value,
            Value::Integer(40)
        );
    }

    #[test]
    fn dates_use_declared_format_first() {
        let expected = NaiveDate::from_ymd_opt(2000, 6, 15);
        assert_eq!(parse_date("2000-06-15", None), expected);
        assert_eq!(parse_date("06/15/2000", None), expected);
        assert_eq!(parse_date("20000615", None), expected);
        assert_eq!(parse_date("15.06.2000", Some("%d.%m.%Y")), expected);
        assert_eq!(parse_date("2000-06-15", Some("%d.%m.%Y")), None);
    }

    #[test]
    fn build_row_reports_sentinel_columns() {
        let columns = vec![
            ColumnSpec::new("id", DataType::Integer),
            ColumnSpec::new("income", DataType::Integer),
        ];
        let (row, hits) = build_row(&columns, ["7", "998"], &sentinels()).unwrap();
        assert_eq!(row, vec![Value::Integer(7), Value::Missing]);
        assert_eq!(hits, vec!["income"]);
    }
}
