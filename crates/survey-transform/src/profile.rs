//! Per-column summaries of a cleaned table.

use std::collections::BTreeSet;

use serde::Serialize;
use survey_model::{DataType, RecordTable, Value};

/// Shape of a column's non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileSummary {
    Numeric { min: f64, mean: f64, max: f64 },
    /// Frequencies in declared level order, zero counts included.
    Levels { counts: Vec<(String, usize)> },
    Distinct { count: usize },
    /// Every value is missing.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: String,
    pub present: usize,
    pub missing: usize,
    pub summary: ProfileSummary,
}

impl ColumnProfile {
    pub fn missing_ratio(&self) -> f64 {
        let total = self.present + self.missing;
        if total == 0 {
            0.0
        } else {
            self.missing as f64 / total as f64
        }
    }
}

/// Summarizes every column of `table`, in column order.
pub fn profile(table: &RecordTable) -> Vec<ColumnProfile> {
    table
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let cells: Vec<&Value> = table
                .rows()
                .iter()
                .map(|row| &row[idx])
                .filter(|cell| !cell.is_missing())
                .collect();
            let missing = table.height() - cells.len();
            let summary = if cells.is_empty() {
                ProfileSummary::Empty
            } else {
                match &field.data_type {
                    DataType::Integer | DataType::Float => numeric_summary(&cells),
                    DataType::Categorical { levels } => level_summary(&cells, levels),
                    DataType::Text | DataType::Date => ProfileSummary::Distinct {
                        count: cells
                            .iter()
                            .copied()
                            .filter_map(Value::raw_text)
                            .collect::<BTreeSet<_>>()
                            .len(),
                    },
                }
            };
            ColumnProfile {
                name: field.name.clone(),
                data_type: field.data_type.name().to_string(),
                present: cells.len(),
                missing,
                summary,
            }
        })
        .collect()
}

fn numeric_summary(cells: &[&Value]) -> ProfileSummary {
    let values: Vec<f64> = cells.iter().copied().filter_map(Value::as_f64).collect();
    if values.is_empty() {
        return ProfileSummary::Empty;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    ProfileSummary::Numeric { min, mean, max }
}

fn level_summary(cells: &[&Value], levels: &[String]) -> ProfileSummary {
    let mut counts: Vec<(String, usize)> = levels.iter().map(|l| (l.clone(), 0)).collect();
    for cell in cells {
        if let Value::Category(level) = cell
            && let Some(entry) = counts.get_mut(level.index)
        {
            entry.1 += 1;
        }
    }
    ProfileSummary::Levels { counts }
}
