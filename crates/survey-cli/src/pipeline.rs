//! Cleaning run with explicit stages.
//!
//! The stages always run in this order:
//! 1. **Read**: parse the source, translate sentinels, exclude bad rows
//! 2. **Dedupe**: drop exact duplicate rows
//! 3. **Normalize**: synonym, categorical and yes/no rules
//! 4. **Derive**: computed columns in declaration order
//!
//! Each stage borrows the previous table and reports what it changed.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, SerWriter};
use serde::Serialize;
use survey_ingest::{ReadReport, read_source};
use survey_model::RecordTable;
use survey_transform::{
    DerivationReport, NormalizeReport, dedupe, derive, normalize, to_dataframe,
};
use tracing::{debug, info, info_span, trace};

use crate::logging::redact_value;
use crate::recipe::Recipe;

/// Everything a run produced: the cleaned table and the per-stage diagnostics.
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub source: PathBuf,
    #[serde(skip)]
    pub table: RecordTable,
    pub read: ReadReport,
    pub duplicates_removed: usize,
    pub normalize: NormalizeReport,
    pub derive: DerivationReport,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunResult {
    /// Rows that did not make it into the cleaned table.
    pub fn rows_dropped(&self) -> usize {
        self.read.excluded_count() + self.duplicates_removed
    }
}

/// Runs every stage of `recipe`, reading from `source_override` when given.
pub fn run_pipeline(recipe: &Recipe, source_override: Option<&Path>) -> Result<RunResult> {
    let start = Instant::now();
    let descriptor = recipe.source_descriptor(source_override)?;
    let run_span = info_span!("run", source = %descriptor.path.display());
    let _run_guard = run_span.enter();

    let outcome = {
        let _span = info_span!("read").entered();
        read_source(&descriptor)
            .with_context(|| format!("read source {}", descriptor.path.display()))?
    };
    for issue in &outcome.report.excluded {
        if let Some(raw) = issue.kind.raw() {
            trace!(record = issue.record, raw = redact_value(raw), "excluded value");
        }
    }

    let deduped = {
        let _span = info_span!("dedupe").entered();
        dedupe(&outcome.table).context("deduplicate rows")?
    };

    let normalized = {
        let _span = info_span!("normalize", rules = recipe.rules.len()).entered();
        normalize(&deduped.table, &recipe.rules).context("normalize columns")?
    };

    let derived = {
        let _span = info_span!("derive", derivations = recipe.derive.len()).entered();
        derive(&normalized.table, &recipe.derive).context("derive columns")?
    };

    let elapsed = start.elapsed();
    info!(
        rows = derived.table.height(),
        columns = derived.table.width(),
        elapsed_ms = elapsed.as_millis() as u64,
        "run complete"
    );
    Ok(RunResult {
        source: descriptor.path,
        table: derived.table,
        read: outcome.report,
        duplicates_removed: deduped.removed,
        normalize: normalized.report,
        derive: derived.report,
        elapsed,
    })
}

/// Narrows the cleaned table to `select`, or returns it whole when empty.
pub fn project(table: &RecordTable, select: &[String]) -> Result<RecordTable> {
    if select.is_empty() {
        return Ok(table.clone());
    }
    let columns: Vec<&str> = select.iter().map(String::as_str).collect();
    table
        .project(&columns)
        .with_context(|| format!("select columns {}", select.join(", ")))
}

/// Writes `table` as CSV with a header row; returns the number of rows written.
pub fn write_csv(table: &RecordTable, path: &Path) -> Result<usize> {
    let mut df = to_dataframe(table).context("build dataframe")?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), "wrote cleaned table");
    Ok(df.height())
}

/// Writes the run diagnostics as pretty JSON.
pub fn write_report(result: &RunResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
