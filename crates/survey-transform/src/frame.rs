//! Hand-off of a cleaned table to polars.

use std::borrow::Cow;

use polars::prelude::{Column, DataFrame, NamedFrom, PlSmallStr, PolarsResult, Series};
use survey_model::{DataType, RecordTable, Value};

use crate::error::Result;

/// Converts a record table into a `DataFrame`.
///
/// Integers become `Int64`, floats `Float64`; text, categorical labels and
/// dates (`%Y-%m-%d`) become `String`. Missing cells become nulls.
pub fn to_dataframe(table: &RecordTable) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.width());
    for (idx, field) in table.fields().iter().enumerate() {
        let cells = table.rows().iter().map(|row| &row[idx]);
        let name: PlSmallStr = field.name.as_str().into();
        let series = match field.data_type {
            DataType::Integer => {
                let values: Vec<Option<i64>> = cells.map(integer_cell).collect();
                Series::new(name, values)
            }
            DataType::Float => {
                let values: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
                Series::new(name, values)
            }
            DataType::Text | DataType::Date | DataType::Categorical { .. } => {
                let values: Vec<Option<String>> = cells
                    .map(|cell| cell.raw_text().map(Cow::into_owned))
                    .collect();
                Series::new(name, values)
            }
        };
        columns.push(series.into());
    }
    DataFrame::new(columns)
}

/// Projects `columns` and converts the result, for consumers that only need a subset.
pub fn project_dataframe(table: &RecordTable, columns: &[&str]) -> Result<DataFrame> {
    let projected = table.project(columns)?;
    Ok(to_dataframe(&projected)?)
}

fn integer_cell(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(v) => Some(*v),
        _ => None,
    }
}
