//! Run summaries rendered as tables on stdout.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::model::ModelSummary;
use crate::pipeline::RunSummary;
use crate::sample::SampleStats;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn print_run_summary(summary: &RunSummary) {
    println!("Source: {}", summary.source_id);
    println!("Output: {}", summary.output.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Rows"),
        header_cell("Duration (ms)"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for stage in &summary.stages {
        table.add_row(vec![
            Cell::new(stage.name),
            Cell::new(stage.rows),
            Cell::new(stage.duration_ms),
        ]);
    }
    table.add_row(vec![
        Cell::new("total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(summary.total_ms).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
}

pub fn print_model_summary(summary: &ModelSummary) {
    println!("Output: {}", summary.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Layer"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for layer in &summary.layers {
        table.add_row(vec![Cell::new(&layer.name), Cell::new(layer.rows)]);
    }
    println!("{table}");
}

pub fn print_sample_summary(stats: &SampleStats) {
    println!("Sample data written to: {}", stats.path.display());
    println!(
        "{} rows ({} duplicates, {} cells nulled)",
        stats.rows_written, stats.duplicate_rows, stats.cells_nulled
    );
}
