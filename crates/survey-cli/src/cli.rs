//! CLI argument definitions for survey-clean.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "survey-clean",
    version,
    about = "Clean and derive survey data from a TOML recipe",
    long_about = "Read a fixed-width, CSV or spreadsheet survey file, translate missing-value\n\
                  codes, drop duplicate rows, normalize categorical answers and derive\n\
                  computed columns such as BMI, BMI class and age."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow raw survey answers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a recipe and print the cleaning summary.
    Run(RunArgs),

    /// Run a recipe and print per-column profiles of the cleaned table.
    Profile(ProfileArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the recipe TOML file.
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Source file to read instead of the recipe's `source.path`.
    #[arg(long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Write the cleaned table as CSV (overrides `output.path`).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Columns to hand downstream, comma separated (overrides `output.select`).
    #[arg(long = "select", value_name = "COLUMNS", value_delimiter = ',')]
    pub select: Vec<String>,

    /// Write run diagnostics as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ProfileArgs {
    /// Path to the recipe TOML file.
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Source file to read instead of the recipe's `source.path`.
    #[arg(long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
