//! Derived columns computed row-wise from existing ones.
//!
//! Derivations are evaluated in declaration order and each appends one
//! column, so a later derivation may read an earlier one (a BMI bucket
//! reading a BMI ratio). A missing or unusable input gives a missing
//! output for that row only.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use survey_model::{DataType, Field, Level, RecordTable, Value};
use tracing::{debug, info};

use crate::error::{Result, TransformError};

/// One derived-column declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Derivation {
    /// `numerator / (denominator * denominator_scale) ^ denominator_power`.
    Ratio {
        name: String,
        numerator: String,
        denominator: String,
        #[serde(default = "default_scale")]
        denominator_scale: f64,
        #[serde(default = "default_power")]
        denominator_power: i32,
    },
    /// Label of the first bucket whose upper bound exceeds the value.
    Bucket {
        name: String,
        source: String,
        bounds: Vec<BucketBound>,
        open_label: String,
    },
    /// Complete years elapsed between two dates.
    Age {
        name: String,
        from: String,
        to: String,
    },
    /// Whole days elapsed between two dates.
    DaysBetween {
        name: String,
        from: String,
        to: String,
    },
}

fn default_scale() -> f64 {
    1.0
}

fn default_power() -> i32 {
    1
}

/// Exclusive upper bound of one bucket and its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketBound {
    pub upper: f64,
    pub label: String,
}

impl BucketBound {
    pub fn new(upper: f64, label: impl Into<String>) -> Self {
        Self {
            upper,
            label: label.into(),
        }
    }
}

impl Derivation {
    /// Body mass index from weight in kilograms and height in centimetres.
    pub fn bmi(
        name: impl Into<String>,
        weight_kg: impl Into<String>,
        height_cm: impl Into<String>,
    ) -> Self {
        Derivation::Ratio {
            name: name.into(),
            numerator: weight_kg.into(),
            denominator: height_cm.into(),
            denominator_scale: 0.01,
            denominator_power: 2,
        }
    }

    /// Name of the column this derivation appends.
    pub fn name(&self) -> &str {
        match self {
            Derivation::Ratio { name, .. }
            | Derivation::Bucket { name, .. }
            | Derivation::Age { name, .. }
            | Derivation::DaysBetween { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Derivation::Ratio { .. } => "ratio",
            Derivation::Bucket { .. } => "bucket",
            Derivation::Age { .. } => "age",
            Derivation::DaysBetween { .. } => "days_between",
        }
    }
}

/// Missing-output count for one derived column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedColumn {
    pub name: String,
    pub data_type: String,
    pub missing: usize,
}

/// Diagnostics for a derivation pass, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationReport {
    pub columns: Vec<DerivedColumn>,
}

impl DerivationReport {
    pub fn missing(&self, name: &str) -> Option<usize> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.missing)
    }
}

/// A table with derived columns appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub table: RecordTable,
    pub report: DerivationReport,
}

/// Appends each derived column to a copy of `table`.
pub fn derive(table: &RecordTable, derivations: &[Derivation]) -> Result<Derived> {
    let mut output = table.clone();
    let mut report = DerivationReport::default();
    for derivation in derivations {
        let name = derivation.name();
        if output.column_index(name).is_some() {
            return Err(TransformError::DuplicateColumn(name.to_string()));
        }
        let (data_type, values) = evaluate(&output, derivation)?;
        let missing = values.iter().filter(|v| v.is_missing()).count();
        debug!(column = name, kind = derivation.kind(), missing, "derived column");
        report.columns.push(DerivedColumn {
            name: name.to_string(),
            data_type: data_type.name().to_string(),
            missing,
        });
        output.append_column(Field::new(name, data_type), values)?;
    }
    info!(derived = derivations.len(), rows = output.height(), "derivation complete");
    Ok(Derived {
        table: output,
        report,
    })
}

fn evaluate(table: &RecordTable, derivation: &Derivation) -> Result<(DataType, Vec<Value>)> {
    match derivation {
        Derivation::Ratio {
            numerator,
            denominator,
            denominator_scale,
            denominator_power,
            ..
        } => {
            let values = pair_values(table, numerator, denominator, |n, d| {
                ratio(
                    n.as_f64()?,
                    d.as_f64()?,
                    *denominator_scale,
                    *denominator_power,
                )
                .map(Value::Float)
            })?;
            Ok((DataType::Float, values))
        }
        Derivation::Bucket {
            name,
            source,
            bounds,
            open_label,
        } => {
            check_bounds(name, bounds)?;
            let levels = bucket_levels(bounds, open_label);
            let values = table
                .column(source)?
                .map(|value| {
                    let Some(v) = value.as_f64() else {
                        return Value::Missing;
                    };
                    let label = bucket_label(v, bounds, open_label);
                    let index = levels.iter().position(|l| l == label).unwrap_or_default();
                    Value::Category(Level::new(index, label))
                })
                .collect();
            Ok((DataType::Categorical { levels }, values))
        }
        Derivation::Age { from, to, .. } => {
            let values = pair_values(table, from, to, |f, t| {
                complete_years(f.as_date()?, t.as_date()?).map(Value::Integer)
            })?;
            Ok((DataType::Integer, values))
        }
        Derivation::DaysBetween { from, to, .. } => {
            let values = pair_values(table, from, to, |f, t| {
                days_between(f.as_date()?, t.as_date()?).map(Value::Integer)
            })?;
            Ok((DataType::Integer, values))
        }
    }
}

fn pair_values<F>(table: &RecordTable, left: &str, right: &str, f: F) -> Result<Vec<Value>>
where
    F: Fn(&Value, &Value) -> Option<Value>,
{
    let left = table.column(left)?;
    let right = table.column(right)?;
    Ok(left
        .zip(right)
        .map(|(l, r)| f(l, r).unwrap_or(Value::Missing))
        .collect())
}

/// Ratio with a scaled, exponentiated denominator.
///
/// Returns `None` for a non-positive denominator or a non-finite result.
pub fn ratio(numerator: f64, denominator: f64, scale: f64, power: i32) -> Option<f64> {
    if denominator <= 0.0 {
        return None;
    }
    let divisor = (denominator * scale).powi(power);
    if !divisor.is_finite() || divisor <= 0.0 {
        return None;
    }
    Some(numerator / divisor).filter(|v| v.is_finite())
}

fn check_bounds(name: &str, bounds: &[BucketBound]) -> Result<()> {
    let finite = bounds.iter().all(|b| b.upper.is_finite());
    let increasing = bounds.windows(2).all(|w| w[0].upper < w[1].upper);
    if finite && increasing {
        Ok(())
    } else {
        Err(TransformError::InvalidBounds {
            name: name.to_string(),
        })
    }
}

fn bucket_levels(bounds: &[BucketBound], open_label: &str) -> Vec<String> {
    let mut levels: Vec<String> = Vec::with_capacity(bounds.len() + 1);
    for label in bounds.iter().map(|b| b.label.as_str()).chain([open_label]) {
        if !levels.iter().any(|l| l == label) {
            levels.push(label.to_string());
        }
    }
    levels
}

/// Label of the first bucket whose upper bound is strictly greater than `value`.
///
/// A value equal to a bound falls into the next bucket.
pub fn bucket_label<'a>(value: f64, bounds: &'a [BucketBound], open_label: &'a str) -> &'a str {
    bounds
        .iter()
        .find(|b| value < b.upper)
        .map_or(open_label, |b| b.label.as_str())
}

/// Number of complete anniversaries of `from` reached by `to`.
///
/// Returns `None` when `from` is after `to`. A Feb 29 start date reaches its
/// anniversary on Mar 1 in non-leap years.
pub fn complete_years(from: NaiveDate, to: NaiveDate) -> Option<i64> {
    if from > to {
        return None;
    }
    let mut years = i64::from(to.year() - from.year());
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    Some(years)
}

/// Days from `from` to `to`; `None` when `from` is after `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> Option<i64> {
    if from > to {
        return None;
    }
    Some((to - from).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bmi_ratio() {
        let bmi = ratio(70.0, 175.0, 0.01, 2).unwrap();
        assert!((bmi - 22.857).abs() < 1e-3);
        assert_eq!(ratio(70.0, 0.0, 0.01, 2), None);
        assert_eq!(ratio(70.0, -175.0, 0.01, 2), None);
    }

    #[test]
    fn bucket_boundary_goes_up() {
        let bounds = vec![
            BucketBound::new(18.5, "Underweight"),
            BucketBound::new(25.0, "Normal weight"),
            BucketBound::new(30.0, "Overweight"),
        ];
        assert_eq!(bucket_label(18.4, &bounds, "Obesity"), "Underweight");
        assert_eq!(bucket_label(18.5, &bounds, "Obesity"), "Normal weight");
        assert_eq!(bucket_label(30.0, &bounds, "Obesity"), "Obesity");
        assert_eq!(bucket_label(31.0, &bounds, "Obesity"), "Obesity");
    }

    #[test]
    fn bounds_must_increase() {
        let bounds = vec![BucketBound::new(25.0, "a"), BucketBound::new(25.0, "b")];
        assert!(check_bounds("x", &bounds).is_err());
        let bounds = vec![BucketBound::new(f64::NAN, "a")];
        assert!(check_bounds("x", &bounds).is_err());
        assert!(check_bounds("x", &[]).is_ok());
    }

    #[test]
    fn complete_years_counts_anniversaries() {
        assert_eq!(complete_years(date(2000, 6, 15), date(2020, 6, 14)), Some(19));
        assert_eq!(complete_years(date(2000, 6, 15), date(2020, 6, 15)), Some(20));
        assert_eq!(complete_years(date(2020, 1, 1), date(2019, 1, 1)), None);
        assert_eq!(complete_years(date(2000, 1, 1), date(2000, 1, 1)), Some(0));
    }

    #[test]
    fn leap_day_anniversary_falls_on_march_first() {
        let born = date(2000, 2, 29);
        assert_eq!(complete_years(born, date(2001, 2, 28)), Some(0));
        assert_eq!(complete_years(born, date(2001, 3, 1)), Some(1));
        assert_eq!(complete_years(born, date(2004, 2, 29)), Some(4));
    }

    #[test]
    fn days_between_rejects_reversed_dates() {
        assert_eq!(days_between(date(2020, 1, 1), date(2020, 3, 1)), Some(60));
        assert_eq!(days_between(date(2020, 3, 1), date(2020, 1, 1)), None);
    }
}
