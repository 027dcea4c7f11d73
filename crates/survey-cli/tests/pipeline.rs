//! End-to-end runs of the cleaning pipeline from a recipe file.

use std::fs;
use std::path::Path;

use survey_cli::pipeline::{project, run_pipeline, write_csv, write_report};
use survey_cli::recipe::Recipe;
use survey_model::Value;
use tempfile::TempDir;

const RECIPE: &str = r#"
[source]
path = "survey.dat"
format = "fixed-width"
missing = [998, 999]

[[columns]]
name = "id"
type = "integer"
span = { start = 1, end = 3 }

[[columns]]
name = "sex"
type = "integer"
span = { start = 4, end = 4 }

[[columns]]
name = "smoker"
type = "text"
span = { start = 5, end = 7 }

[[columns]]
name = "weight_kg"
type = "float"
span = { start = 8, end = 12 }

[[columns]]
name = "height_cm"
type = "float"
span = { start = 13, end = 17 }

[[columns]]
name = "birth_date"
type = "date"
span = { start = 18, end = 27 }

[[columns]]
name = "interview_date"
type = "date"
span = { start = 28, end = 37 }

[[rules]]
kind = "categorical"
columns = ["sex"]
mapping = [{ code = 1, label = "Male" }, { code = 2, label = "Female" }]

[[rules]]
kind = "binary"
columns = ["smoker"]

[[derive]]
kind = "ratio"
name = "bmi"
numerator = "weight_kg"
denominator = "height_cm"
denominator_scale = 0.01
denominator_power = 2

[[derive]]
kind = "bucket"
name = "bmi_class"
source = "bmi"
open_label = "Obesity"
bounds = [
    { upper = 18.5, label = "Underweight" },
    { upper = 25.0, label = "Normal weight" },
    { upper = 30.0, label = "Overweight" },
]

[[derive]]
kind = "age"
name = "age"
from = "birth_date"
to = "interview_date"

[output]
select = ["id", "bmi_class", "age"]
"#;

fn record(
    id: u32,
    sex: u32,
    smoker: &str,
    weight: &str,
    height: &str,
    birth: &str,
    interview: &str,
) -> String {
    format!("{id:>3}{sex:1}{smoker:<3}{weight:>5}{height:>5}{birth:10}{interview:10}\n")
}

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let mut data = String::new();
    data.push_str(&record(1, 1, "Y", "70", "175", "2000-06-15", "2020-06-14"));
    data.push_str(&record(2, 2, "no", "998", "160", "1990-01-01", "2020-01-01"));
    data.push_str(&record(2, 2, "no", "998", "160", "1990-01-01", "2020-01-01"));
    data.push_str("  4\n");
    data.push_str(&record(3, 9, "yes", "90", "170", "2020-01-01", "2019-01-01"));
    fs::write(dir.join("survey.dat"), data).unwrap();
    let recipe = dir.join("recipe.toml");
    fs::write(&recipe, RECIPE).unwrap();
    recipe
}

#[test]
fn full_run_cleans_and_derives() {
    let dir = TempDir::new().unwrap();
    let recipe = Recipe::load(&write_fixture(dir.path())).unwrap();
    let result = run_pipeline(&recipe, None).unwrap();

    assert_eq!(result.read.records_seen, 5);
    assert_eq!(result.read.excluded_count(), 1);
    assert_eq!(result.duplicates_removed, 1);
    assert_eq!(result.rows_dropped(), 2);
    assert_eq!(result.table.height(), 3);
    assert_eq!(result.read.sentinel_hits.get("weight_kg"), Some(&2));

    let table = &result.table;
    assert_eq!(table.value(0, "sex").and_then(Value::as_label), Some("Male"));
    assert_eq!(table.value(0, "smoker").and_then(Value::as_label), Some("Yes"));
    assert_eq!(table.value(0, "age"), Some(&Value::Integer(19)));
    assert_eq!(
        table.value(0, "bmi_class").and_then(Value::as_label),
        Some("Normal weight")
    );
    assert_eq!(table.value(1, "bmi"), Some(&Value::Missing));
    assert_eq!(table.value(1, "bmi_class"), Some(&Value::Missing));
    assert_eq!(table.value(2, "sex"), Some(&Value::Missing));
    assert_eq!(table.value(2, "age"), Some(&Value::Missing));
    assert_eq!(
        table.value(2, "bmi_class").and_then(Value::as_label),
        Some("Obesity")
    );
    assert_eq!(result.normalize.unmapped("sex"), 1);
    assert_eq!(result.derive.missing("bmi"), Some(1));
}

#[test]
fn cleaned_table_is_written_as_csv() {
    let dir = TempDir::new().unwrap();
    let recipe = Recipe::load(&write_fixture(dir.path())).unwrap();
    let result = run_pipeline(&recipe, None).unwrap();
    let selected = project(&result.table, &recipe.output.select).unwrap();

    let out = dir.path().join("clean.csv");
    let rows = write_csv(&selected, &out).unwrap();
    assert_eq!(rows, 3);
    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,bmi_class,age"));
    assert_eq!(lines.next(), Some("1,Normal weight,19"));

    let report = dir.path().join("report.json");
    write_report(&result, &report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["duplicates_removed"], 1);
    assert_eq!(json["read"]["excluded"][0]["kind"], "too_short");
}

#[test]
fn unknown_selection_is_an_error() {
    let dir = TempDir::new().unwrap();
    let recipe = Recipe::load(&write_fixture(dir.path())).unwrap();
    let result = run_pipeline(&recipe, None).unwrap();
    let err = project(&result.table, &["id".to_string(), "weight".to_string()]).unwrap_err();
    assert!(format!("{err:#}").contains("weight"));
}

#[test]
fn missing_source_aborts_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let recipe = Recipe::load(&write_fixture(dir.path())).unwrap();
    let absent = dir.path().join("absent.dat");
    let err = run_pipeline(&recipe, Some(&absent)).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("source file not found"), "{message}");
}

#[test]
fn unparseable_recipe_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[source\npath = 1").unwrap();
    let err = Recipe::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("parse recipe"));
}
