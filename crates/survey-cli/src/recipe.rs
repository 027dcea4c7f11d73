//! Cleaning recipes: one TOML file describing a source and what to do with it.
//!
//! ```toml
//! [source]
//! path = "brfss.dat"
//! format = "fixed-width"
//! missing = [998, 999, "Don't know"]
//!
//! [[columns]]
//! name = "weight_kg"
//! type = "float"
//! span = { start = 12, end = 16 }
//!
//! [[rules]]
//! kind = "binary"
//! columns = ["smoker"]
//!
//! [[derive]]
//! kind = "ratio"
//! name = "bmi"
//! numerator = "weight_kg"
//! denominator = "height_cm"
//! denominator_scale = 0.01
//! denominator_power = 2
//!
//! [output]
//! select = ["id", "bmi"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use survey_ingest::{SourceDescriptor, SourceFormat};
use survey_model::{ColumnSpec, SentinelSet};
use survey_transform::{ColumnRule, Derivation, RawCode};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub source: SourceSection,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub rules: Vec<ColumnRule>,
    #[serde(default)]
    pub derive: Vec<Derivation>,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub path: PathBuf,
    /// Inferred from the file extension when absent.
    #[serde(default)]
    pub format: Option<SourceFormat>,
    #[serde(default)]
    pub sheet: Option<SheetRef>,
    /// Raw values meaning "no answer"; numbers and strings both allowed.
    #[serde(default)]
    pub missing: Vec<RawCode>,
}

/// Worksheet by name or by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl SheetRef {
    fn to_selector(&self) -> String {
        match self {
            SheetRef::Index(idx) => idx.to_string(),
            SheetRef::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Where to write the cleaned table as CSV.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Columns handed downstream, in this order; all columns when empty.
    #[serde(default)]
    pub select: Vec<String>,
}

impl Recipe {
    /// Reads and parses a recipe, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read recipe {}", path.display()))?;
        let mut recipe = Self::parse(&text)
            .with_context(|| format!("parse recipe {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        recipe.source.path = resolve(base, &recipe.source.path);
        if let Some(output) = &recipe.output.path {
            recipe.output.path = Some(resolve(base, output));
        }
        Ok(recipe)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let recipe: Recipe = toml::from_str(text)?;
        if recipe.columns.is_empty() {
            return Err(anyhow!("recipe declares no [[columns]]"));
        }
        Ok(recipe)
    }

    /// Source descriptor for this recipe; `path_override` replaces `source.path`.
    pub fn source_descriptor(&self, path_override: Option<&Path>) -> Result<SourceDescriptor> {
        let path = path_override.unwrap_or(&self.source.path);
        let format = match self.source.format {
            Some(format) => format,
            None => SourceFormat::from_path(path).ok_or_else(|| {
                anyhow!(
                    "cannot infer source format of {}; set source.format",
                    path.display()
                )
            })?,
        };
        let missing: SentinelSet = self.source.missing.iter().map(RawCode::canonical).collect();
        let mut descriptor =
            SourceDescriptor::new(path, format, self.columns.clone()).with_missing(missing);
        if let Some(sheet) = &self.source.sheet {
            descriptor = descriptor.with_sheet(sheet.to_selector());
        }
        Ok(descriptor)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
