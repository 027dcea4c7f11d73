use std::path::PathBuf;

use survey_cli::pipeline::RunResult;

#[derive(Debug)]
pub struct RunSummary {
    pub result: RunResult,
    pub selected: Vec<String>,
    pub output: Option<(PathBuf, usize)>,
    pub report: Option<PathBuf>,
}
