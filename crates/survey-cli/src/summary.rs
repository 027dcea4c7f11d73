use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use survey_cli::pipeline::RunResult;
use survey_model::format_numeric;
use survey_transform::{ColumnProfile, ProfileSummary};

use crate::types::RunSummary;

/// Excluded rows listed individually before the list is cut off.
const MAX_LISTED_ISSUES: usize = 20;

pub fn print_run_summary(summary: &RunSummary) {
    let result = &summary.result;
    println!("Source: {}", result.source.display());
    println!(
        "Rows: {} kept of {} read ({} excluded, {} duplicates removed)",
        result.table.height(),
        result.read.records_seen,
        result.read.excluded_count(),
        result.duplicates_removed
    );
    if let Some((path, rows)) = &summary.output {
        println!("Output: {} ({rows} rows)", path.display());
    }
    if let Some(path) = &summary.report {
        println!("Report: {}", path.display());
    }
    if !summary.selected.is_empty() {
        println!("Selected: {}", summary.selected.join(", "));
    }
    println!("{}", column_table(result));
    print_issue_table(result);
}

fn column_table(result: &RunResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Missing"),
        header_cell("Sentinels"),
        header_cell("Collapsed"),
        header_cell("Unmapped"),
        header_cell("Derived"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 6, CellAlignment::Center);

    let mut total_missing = 0usize;
    for (idx, field) in result.table.fields().iter().enumerate() {
        let missing = result
            .table
            .rows()
            .iter()
            .filter(|row| row[idx].is_missing())
            .count();
        total_missing += missing;
        let counts = result.normalize.columns.get(&field.name);
        let derived = result.derive.missing(&field.name).is_some();
        table.add_row(vec![
            Cell::new(&field.name),
            dim_cell(field.data_type.name()),
            count_cell(Some(missing), Color::Yellow),
            count_cell(result.read.sentinel_hits.get(&field.name).copied(), Color::Blue),
            count_cell(counts.map(|c| c.collapsed), Color::Blue),
            count_cell(counts.map(|c| c.unmapped), Color::Red),
            if derived {
                Cell::new("yes").fg(Color::Green)
            } else {
                dim_cell("-")
            },
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(Some(total_missing), Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(Some(result.read.sentinel_total()), Color::Blue).add_attribute(Attribute::Bold),
        count_cell(Some(result.normalize.total_collapsed()), Color::Blue)
            .add_attribute(Attribute::Bold),
        count_cell(Some(result.normalize.total_unmapped()), Color::Red)
            .add_attribute(Attribute::Bold),
        dim_cell(result.derive.columns.len()),
    ]);
    table
}

fn print_issue_table(result: &RunResult) {
    let excluded = &result.read.excluded;
    if excluded.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Record"), header_cell("Reason")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in excluded.iter().take(MAX_LISTED_ISSUES) {
        table.add_row(vec![Cell::new(issue.record), Cell::new(issue.kind.to_string())]);
    }
    if excluded.len() > MAX_LISTED_ISSUES {
        table.add_row(vec![
            dim_cell("..."),
            dim_cell(format!("{} more", excluded.len() - MAX_LISTED_ISSUES)),
        ]);
    }
    println!("Excluded rows:");
    println!("{table}");
}

pub fn print_profiles(profiles: &[ColumnProfile]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Present"),
        header_cell("Missing"),
        header_cell("Summary"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for profile in profiles {
        table.add_row(vec![
            Cell::new(&profile.name),
            dim_cell(&profile.data_type),
            Cell::new(profile.present),
            count_cell(Some(profile.missing), Color::Yellow),
            Cell::new(describe(&profile.summary)),
        ]);
    }
    println!("{table}");
}

fn describe(summary: &ProfileSummary) -> String {
    match summary {
        ProfileSummary::Numeric { min, mean, max } => format!(
            "min {}  mean {}  max {}",
            format_numeric(round2(*min)),
            format_numeric(round2(*mean)),
            format_numeric(round2(*max))
        ),
        ProfileSummary::Levels { counts } => counts
            .iter()
            .map(|(label, count)| format!("{label}: {count}"))
            .collect::<Vec<_>>()
            .join(", "),
        ProfileSummary::Distinct { count } => format!("{count} distinct"),
        ProfileSummary::Empty => "all missing".to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
