use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use sdmx_cli::RunSummary;
use sdmx_model::{QualityCheck, QualityReport};

pub fn print_summary(summary: &RunSummary) {
    if let Some(path) = &summary.combined_document {
        println!("Combined document: {}", path.display());
    }
    if let Some(path) = &summary.quality_report {
        println!("Quality reports: {}", path.display());
    }
    if let Some(path) = &summary.audit_table {
        println!("Audit table: {} ({} rows)", path.display(), summary.audit_rows);
    }
    println!("{}", totals_table(summary));
    if !summary.reports.is_empty() {
        println!("{}", quality_table(&summary.reports, summary.mean_rating()));
    }
    if !summary.prefix_conflicts.is_empty() {
        eprintln!("Prefix conflicts:");
        for conflict in &summary.prefix_conflicts {
            eprintln!("- {conflict}");
        }
    }
    if !summary.warnings.is_empty() {
        eprintln!("Skipped ({}):", summary.warnings.len());
        for warning in &summary.warnings {
            eprintln!("- {warning}");
        }
    }
}

fn totals_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Item"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);

    let mut rows: Vec<(&str, String, usize, Option<Color>)> = vec![
        ("sources", "registry rows".to_string(), summary.total_sources, None),
        (
            "sources",
            "duplicates skipped".to_string(),
            summary.duplicate_sources,
            Some(Color::Yellow),
        ),
        (
            "sources",
            "incomplete rows".to_string(),
            summary.incomplete_sources,
            Some(Color::Yellow),
        ),
        ("retrieve", "saved".to_string(), summary.retrieved, None),
        (
            "retrieve",
            "failed".to_string(),
            summary.retrieval_failures,
            Some(Color::Red),
        ),
        ("flatten", "flattened".to_string(), summary.flattened, None),
        (
            "flatten",
            "missing documents".to_string(),
            summary.missing_documents,
            Some(Color::Yellow),
        ),
        (
            "flatten",
            "malformed documents".to_string(),
            summary.malformed_documents,
            Some(Color::Red),
        ),
    ];
    for (reason, count) in &summary.filtered_out {
        rows.push((
            "analyze",
            format!("filtered out: {reason}"),
            *count,
            Some(Color::Yellow),
        ));
    }
    rows.extend([
        (
            "analyze",
            "filtered code lists".to_string(),
            summary.filtered_lists,
            None,
        ),
        ("analyze", "filtered codes".to_string(), summary.filtered_codes, None),
        ("analyze", "agency groups".to_string(), summary.agency_groups, None),
        ("generate", "documents".to_string(), summary.generated_documents, None),
        (
            "generate",
            "failed".to_string(),
            summary.generation_failures,
            Some(Color::Red),
        ),
        (
            "generate",
            "prefix conflicts".to_string(),
            summary.prefix_conflicts.len(),
            Some(Color::Red),
        ),
        ("check", "clean documents".to_string(), summary.clean_documents(), None),
        (
            "check",
            "missing organization labels".to_string(),
            summary.audit_rows,
            Some(Color::Yellow),
        ),
    ]);

    for (stage, item, count, alert) in rows {
        table.add_row(vec![
            Cell::new(stage).fg(Color::Blue),
            Cell::new(item),
            count_cell(count, alert),
        ]);
    }
    table
}

fn quality_table(reports: &[QualityReport], mean: Option<f64>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Rating"),
        header_cell("Failed checks"),
        header_cell("Findings"),
        header_cell("Triples"),
        header_cell("Links"),
        header_cell("Unused prefixes"),
    ]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for index in [1, 3, 4, 5] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for report in reports {
        let failed: Vec<&str> = report
            .failed_checks()
            .into_iter()
            .map(QualityCheck::as_str)
            .collect();
        table.add_row(vec![
            Cell::new(&report.document_id),
            rating_cell(report.rating),
            if failed.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(failed.join(", ")).fg(Color::Red)
            },
            Cell::new(report.findings.len()),
            Cell::new(report.metrics.triples),
            Cell::new(report.metrics.external_links),
            if report.metrics.unused_prefixes.is_empty() {
                dim_cell("-")
            } else {
                dim_cell(report.metrics.unused_prefixes.join(", "))
            },
        ]);
    }
    if let Some(mean) = mean {
        table.add_row(vec![
            Cell::new("MEAN")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            rating_cell(mean).add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn rating_cell(rating: f64) -> Cell {
    let color = if rating >= 1.0 {
        Color::Green
    } else if rating >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{rating:.2}")).fg(color)
}

fn count_cell(count: usize, alert: Option<Color>) -> Cell {
    match alert {
        Some(color) if count > 0 => Cell::new(count).fg(color),
        _ if count == 0 => dim_cell(count),
        _ => Cell::new(count),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
