//! Library side of the survey-clean CLI: recipes, the staged pipeline and
//! logging setup. The binary adds argument parsing and summary tables.

pub mod logging;
pub mod pipeline;
pub mod recipe;
