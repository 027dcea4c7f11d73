//! Column normalization: synonym collapsing, categorical labeling and
//! yes/no standardization.
//!
//! Every rule names the columns it applies to. Synonym rules always run
//! before labeling rules, whatever order they are declared in, so a
//! categorical mapping only ever sees already-collapsed values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use survey_model::{DataType, Level, RecordTable, Value, format_numeric, parse_f64};
use tracing::{debug, info, warn};

use crate::error::{Result, TransformError};

/// One normalization rule over an explicit list of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ColumnRule {
    /// Collapses spelling variants to a canonical text value or to missing.
    Synonyms {
        columns: Vec<String>,
        #[serde(default)]
        groups: Vec<SynonymGroup>,
        /// Free-text answers that mean "no answer".
        #[serde(default)]
        missing: Vec<String>,
    },
    /// Maps raw codes to labels of an ordered categorical.
    Categorical {
        columns: Vec<String>,
        mapping: Vec<CodeLabel>,
        /// Level order; defaults to distinct labels in mapping order.
        #[serde(default)]
        levels: Option<Vec<String>>,
    },
    /// Two-level `[no, yes]` categorical from yes/no style answers.
    Binary {
        columns: Vec<String>,
        #[serde(default = "default_yes")]
        yes: String,
        #[serde(default = "default_no")]
        no: String,
        #[serde(default)]
        yes_spellings: Vec<String>,
        #[serde(default)]
        no_spellings: Vec<String>,
    },
}

fn default_yes() -> String {
    "Yes".to_string()
}

fn default_no() -> String {
    "No".to_string()
}

const YES_SPELLINGS: &[&str] = &["y", "yes", "true", "1"];
const NO_SPELLINGS: &[&str] = &["n", "no", "false", "0"];

/// Variants that collapse to one canonical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynonymGroup {
    pub canonical: String,
    pub variants: Vec<String>,
}

/// A raw code as written in a recipe: `1` and `"1"` are the same code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCode {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawCode {
    /// Canonical text form, comparable with [`Value::raw_text`].
    pub fn canonical(&self) -> String {
        match self {
            RawCode::Integer(v) => v.to_string(),
            RawCode::Float(v) => format_numeric(*v),
            RawCode::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<i64> for RawCode {
    fn from(v: i64) -> Self {
        RawCode::Integer(v)
    }
}

impl From<&str> for RawCode {
    fn from(v: &str) -> Self {
        RawCode::Text(v.to_string())
    }
}

/// One `(raw code, label)` entry of a categorical mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeLabel {
    pub code: RawCode,
    pub label: String,
}

impl CodeLabel {
    pub fn new(code: impl Into<RawCode>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collapse,
    Label,
}

impl ColumnRule {
    pub fn columns(&self) -> &[String] {
        match self {
            ColumnRule::Synonyms { columns, .. }
            | ColumnRule::Categorical { columns, .. }
            | ColumnRule::Binary { columns, .. } => columns,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnRule::Synonyms { .. } => "synonyms",
            ColumnRule::Categorical { .. } => "categorical",
            ColumnRule::Binary { .. } => "binary",
        }
    }

    fn phase(&self) -> Phase {
        match self {
            ColumnRule::Synonyms { .. } => Phase::Collapse,
            ColumnRule::Categorical { .. } | ColumnRule::Binary { .. } => Phase::Label,
        }
    }
}

/// Per-column counters for one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnCounts {
    /// Values rewritten to a canonical synonym.
    pub collapsed: usize,
    /// Values a synonym rule declared as missing.
    pub to_missing: usize,
    /// Non-missing values no mapping or spelling covered, now missing.
    pub unmapped: usize,
}

/// Diagnostics for a normalization pass, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub columns: BTreeMap<String, ColumnCounts>,
}

impl NormalizeReport {
    pub fn unmapped(&self, column: &str) -> usize {
        self.columns.get(column).map_or(0, |c| c.unmapped)
    }

    pub fn total_unmapped(&self) -> usize {
        self.columns.values().map(|c| c.unmapped).sum()
    }

    pub fn total_collapsed(&self) -> usize {
        self.columns.values().map(|c| c.collapsed).sum()
    }

    fn entry(&mut self, column: &str) -> &mut ColumnCounts {
        self.columns.entry(column.to_string()).or_default()
    }
}

/// A normalized copy of the input table.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: RecordTable,
    pub report: NormalizeReport,
}

/// Applies `rules` to a copy of `table`.
///
/// The input is never modified, so the same loaded table can be normalized
/// repeatedly with different rule sets. Unknown columns, inconsistent
/// level declarations and binary rules whose yes and no spellings overlap
/// are fatal; uncovered values become missing and are counted.
pub fn normalize(table: &RecordTable, rules: &[ColumnRule]) -> Result<Normalized> {
    for rule in rules {
        for column in rule.columns() {
            table.require_column(column)?;
            if let ColumnRule::Binary {
                yes,
                no,
                yes_spellings,
                no_spellings,
                ..
            } = rule
            {
                binary_spellings(column, yes, no, yes_spellings, no_spellings)?;
            }
        }
    }

    let mut output = table.clone();
    let mut report = NormalizeReport::default();
    let ordered = rules
        .iter()
        .filter(|rule| rule.phase() == Phase::Collapse)
        .chain(rules.iter().filter(|rule| rule.phase() == Phase::Label));
    for rule in ordered {
        debug!(kind = rule.kind(), columns = ?rule.columns(), "applying rule");
        for column in rule.columns() {
            apply_rule(&mut output, rule, column, report.entry(column))?;
        }
    }

    for (column, counts) in &report.columns {
        if counts.unmapped > 0 {
            warn!(column = %column, unmapped = counts.unmapped, "values without a mapping set to missing");
        }
    }
    info!(
        rules = rules.len(),
        collapsed = report.total_collapsed(),
        unmapped = report.total_unmapped(),
        "normalization complete"
    );
    Ok(Normalized {
        table: output,
        report,
    })
}

fn apply_rule(
    table: &mut RecordTable,
    rule: &ColumnRule,
    column: &str,
    counts: &mut ColumnCounts,
) -> Result<()> {
    let current: Vec<Value> = table.column(column)?.cloned().collect();
    let (data_type, values) = match rule {
        ColumnRule::Synonyms {
            groups, missing, ..
        } => (DataType::Text, collapse_synonyms(&current, groups, missing, counts)),
        ColumnRule::Categorical {
            mapping, levels, ..
        } => {
            let levels = resolve_levels(column, mapping, levels.as_deref())?;
            let values = label_codes(&current, mapping, &levels, counts);
            (DataType::Categorical { levels }, values)
        }
        ColumnRule::Binary {
            yes,
            no,
            yes_spellings,
            no_spellings,
            ..
        } => {
            let (yes_set, no_set) =
                binary_spellings(column, yes, no, yes_spellings, no_spellings)?;
            let values = standardize_binary(&current, (yes, &yes_set), (no, &no_set), counts);
            let levels = vec![no.clone(), yes.clone()];
            (DataType::Categorical { levels }, values)
        }
    };
    table.replace_column(column, data_type, values)?;
    Ok(())
}

/// Lowercased text with inner whitespace runs collapsed to one space.
fn synonym_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collapse_synonyms(
    values: &[Value],
    groups: &[SynonymGroup],
    missing: &[String],
    counts: &mut ColumnCounts,
) -> Vec<Value> {
    let mut lookup: BTreeMap<String, &str> = BTreeMap::new();
    for group in groups {
        lookup.insert(synonym_key(&group.canonical), &group.canonical);
        for variant in &group.variants {
            lookup.insert(synonym_key(variant), &group.canonical);
        }
    }
    let missing: BTreeSet<String> = missing.iter().map(String::as_str).map(synonym_key).collect();

    values
        .iter()
        .map(|value| {
            let Some(raw) = value.raw_text() else {
                return Value::Missing;
            };
            let key = synonym_key(&raw);
            if missing.contains(&key) {
                counts.to_missing += 1;
                return Value::Missing;
            }
            match lookup.get(&key) {
                Some(canonical) => {
                    if *canonical != raw.as_ref() {
                        counts.collapsed += 1;
                    }
                    Value::Text((*canonical).to_string())
                }
                None => Value::Text(raw.into_owned()),
            }
        })
        .collect()
}

fn resolve_levels(
    column: &str,
    mapping: &[CodeLabel],
    declared: Option<&[String]>,
) -> Result<Vec<String>> {
    match declared {
        Some(levels) => {
            if let Some(entry) = mapping.iter().find(|e| !levels.contains(&e.label)) {
                return Err(TransformError::UnknownLevel {
                    column: column.to_string(),
                    label: entry.label.clone(),
                });
            }
            Ok(levels.to_vec())
        }
        None => {
            let mut levels: Vec<String> = Vec::new();
            for entry in mapping {
                if !levels.contains(&entry.label) {
                    levels.push(entry.label.clone());
                }
            }
            Ok(levels)
        }
    }
}

/// True if two canonical texts denote the same code, textually or numerically.
fn codes_match(code: &str, raw: &str) -> bool {
    if code == raw {
        return true;
    }
    match (parse_f64(code), parse_f64(raw)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn label_codes(
    values: &[Value],
    mapping: &[CodeLabel],
    levels: &[String],
    counts: &mut ColumnCounts,
) -> Vec<Value> {
    let codes: Vec<(String, Level)> = mapping
        .iter()
        .filter_map(|entry| {
            let index = levels.iter().position(|l| *l == entry.label)?;
            Some((entry.code.canonical(), Level::new(index, entry.label.clone())))
        })
        .collect();

    values
        .iter()
        .map(|value| {
            let Some(raw) = value.raw_text() else {
                return Value::Missing;
            };
            match codes.iter().find(|(code, _)| codes_match(code, &raw)) {
                Some((_, level)) => Value::Category(level.clone()),
                None => {
                    counts.unmapped += 1;
                    Value::Missing
                }
            }
        })
        .collect()
}

/// Lowercased yes and no spellings of a binary rule, labels included.
///
/// A spelling in both sets makes the rule ambiguous; equal labels are the
/// simplest case of that.
fn binary_spellings(
    column: &str,
    yes: &str,
    no: &str,
    yes_spellings: &[String],
    no_spellings: &[String],
) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
    let spellings = |builtin: &[&str], extra: &[String], label: &str| -> BTreeSet<String> {
        builtin
            .iter()
            .map(|s| (*s).to_string())
            .chain(extra.iter().map(|s| s.trim().to_lowercase()))
            .chain(std::iter::once(label.trim().to_lowercase()))
            .collect()
    };
    let yes_set = spellings(YES_SPELLINGS, yes_spellings, yes);
    let no_set = spellings(NO_SPELLINGS, no_spellings, no);
    if let Some(shared) = yes_set.intersection(&no_set).next() {
        return Err(TransformError::AmbiguousSpelling {
            column: column.to_string(),
            spelling: shared.clone(),
        });
    }
    Ok((yes_set, no_set))
}

fn standardize_binary(
    values: &[Value],
    (yes, yes_set): (&str, &BTreeSet<String>),
    (no, no_set): (&str, &BTreeSet<String>),
    counts: &mut ColumnCounts,
) -> Vec<Value> {
    values
        .iter()
        .map(|value| {
            let Some(raw) = value.raw_text() else {
                return Value::Missing;
            };
            let key = raw.trim().to_lowercase();
            if yes_set.contains(&key) {
                Value::Category(Level::new(1, yes))
            } else if no_set.contains(&key) {
                Value::Category(Level::new(0, no))
            } else {
                counts.unmapped += 1;
                Value::Missing
            }
        })
        .collect()
}
