//! Spreadsheet header canonicalization.

use std::collections::BTreeSet;
use std::path::Path;

use survey_model::ColumnSpec;

use crate::error::{IngestError, Result};

/// Canonical form of a header name.
///
/// Case-folds, collapses every run of whitespace or punctuation to a single
/// `_` and drops leading/trailing separators, so `" Weight (kg) "`,
/// `"weight_kg"` and `"WEIGHT-KG"` all become `weight_kg`.
pub fn canonical_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_separator = true;
    for ch in trimmed.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Canonicalizes a whole header row.
///
/// Empty headers become `column_<n>` (1-based position); repeated names get
/// `_2`, `_3`, ... suffixes in order of appearance.
pub fn canonical_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut taken = BTreeSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for (idx, header) in raw.iter().enumerate() {
        let mut base = canonical_header(header.as_ref());
        if base.is_empty() {
            base = format!("column_{}", idx + 1);
        }
        let mut candidate = base.clone();
        let mut suffix = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Resolves each declared column to its position in a canonicalized header row.
///
/// Fails on the first declared header that is absent.
pub(crate) fn resolve_columns(
    path: &Path,
    headers: &[String],
    columns: &[ColumnSpec],
) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|column| {
            let wanted = canonical_header(column.header_name());
            headers
                .iter()
                .position(|header| *header == wanted)
                .ok_or_else(|| IngestError::MissingColumn {
                    column: column.name.clone(),
                    header: column.header_name().to_string(),
                    path: path.to_path_buf(),
                })
        })
        .collect()
}
