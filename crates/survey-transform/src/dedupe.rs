//! Exact-duplicate row removal.

use std::collections::BTreeSet;

use survey_model::RecordTable;
use tracing::info;

use crate::error::Result;

/// Table with exact duplicate rows removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduplicated {
    pub table: RecordTable,
    pub removed: usize,
}

/// Collapses rows that are identical in every column to their first occurrence.
///
/// Remaining rows keep their original order. Float cells compare by bit
/// pattern and missing cells compare equal to each other, so running this
/// twice removes nothing the second time.
pub fn dedupe(table: &RecordTable) -> Result<Deduplicated> {
    let mut seen = BTreeSet::new();
    let keep: Vec<bool> = table
        .rows()
        .iter()
        .map(|row| {
            let mut composite = String::new();
            for (pos, value) in row.iter().enumerate() {
                if pos > 0 {
                    composite.push('|');
                }
                value.write_key(&mut composite);
            }
            seen.insert(composite)
        })
        .collect();
    let removed = keep.iter().filter(|kept| !**kept).count();
    info!(rows = table.height(), removed, "deduplicated rows");
    Ok(Deduplicated {
        table: table.filter_rows(&keep)?,
        removed,
    })
}
