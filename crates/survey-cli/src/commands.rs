use anyhow::{Context, Result};
use tracing::info;

use survey_cli::pipeline::{project, run_pipeline, write_csv, write_report};
use survey_cli::recipe::Recipe;
use survey_transform::{ColumnProfile, profile};

use crate::cli::{ProfileArgs, RunArgs};
use crate::types::RunSummary;

pub fn run_clean(args: &RunArgs) -> Result<RunSummary> {
    let recipe = Recipe::load(&args.recipe)?;
    let result = run_pipeline(&recipe, args.source.as_deref())?;

    let selected = if args.select.is_empty() {
        recipe.output.select.clone()
    } else {
        args.select.clone()
    };
    let handed_off = project(&result.table, &selected)?;

    let output = match args.output.as_ref().or(recipe.output.path.as_ref()) {
        Some(path) => {
            let rows = write_csv(&handed_off, path)
                .with_context(|| format!("write cleaned table to {}", path.display()))?;
            info!(path = %path.display(), rows, "cleaned table written");
            Some((path.clone(), rows))
        }
        None => None,
    };
    if let Some(path) = &args.report {
        write_report(&result, path)?;
    }

    Ok(RunSummary {
        result,
        selected,
        output,
        report: args.report.clone(),
    })
}

pub fn run_profile(args: &ProfileArgs) -> Result<Vec<ColumnProfile>> {
    let recipe = Recipe::load(&args.recipe)?;
    let result = run_pipeline(&recipe, args.source.as_deref())?;
    let table = project(&result.table, &recipe.output.select)?;
    Ok(profile(&table))
}
