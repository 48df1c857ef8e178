use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{ReportFormat, SelectionArgs};
use crate::error::Result;
use crate::fmt::money;
use crate::html;
use crate::importer::UploadInfo;
use crate::pipeline::{self, PipelineOutput};
use crate::render::{Dashboard, Rendered, Trend};
use crate::settings::shellexpand_path;

pub fn run(selection: &SelectionArgs, format: ReportFormat, output: Option<&str>) -> Result<()> {
    let (selections, source) = selection.resolve()?;
    let out = pipeline::run(&source.records, &selections);

    let body = match format {
        ReportFormat::Text => format_text(&out, source.upload.as_ref()),
        ReportFormat::Json => format!("{}\n", serde_json::to_string_pretty(&out)?),
        ReportFormat::Html => html::page(
            &out.rendered,
            selections.theme,
            source.upload.as_ref(),
            source.notice.as_deref(),
        )?,
    };

    match output {
        Some(path) => {
            let path = shellexpand_path(path);
            write_report(Path::new(&path), &body)?;
            println!("Wrote {path}");
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn write_report(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting (pipeline output → String)
// ---------------------------------------------------------------------------

pub fn format_text(out: &PipelineOutput, upload: Option<&UploadInfo>) -> String {
    let mut text = String::from("Dashboard Financiero\n");
    if let Some(info) = upload {
        text.push_str(&format!("Source: {} ({} bytes)\n", info.name, info.size));
    }
    match &out.rendered {
        Rendered::Empty { notice } => {
            text.push_str(&format!("{}\n", notice.yellow()));
        }
        Rendered::Dashboard(dash) => {
            text.push_str(&format_metrics(dash));
            text.push_str(&format!("\n\n{}", format_monthly(dash)));
            text.push_str(&format!("\n\n{}", format_categories(out)));
            text.push_str(&format!("\n\n{}\n", format_records(dash)));
        }
    }
    text
}

fn format_metrics(dash: &Dashboard) -> String {
    let mut table = Table::new();
    table.set_header(dash.metrics.iter().map(|m| m.label).collect::<Vec<_>>());
    table.add_row(
        dash.metrics
            .iter()
            .map(|m| match m.trend {
                Some(Trend::Up) => Cell::new(format!("{} \u{25b2}", m.value).green().bold()),
                Some(Trend::Down) => Cell::new(format!("{} \u{25bc}", m.value).red().bold()),
                None => Cell::new(&m.value),
            })
            .collect::<Vec<_>>(),
    );
    table.to_string()
}

fn format_monthly(dash: &Dashboard) -> String {
    let chart = &dash.line_chart;
    let mut table = Table::new();
    table.set_header(vec!["Date", "Income", "Expense"]);
    for (i, date) in chart.x.iter().enumerate() {
        let value = |s: usize| {
            chart
                .series
                .get(s)
                .and_then(|series| series.values.get(i))
                .copied()
                .unwrap_or(0.0)
        };
        table.add_row(vec![
            Cell::new(date),
            Cell::new(money(value(0))).set_alignment(CellAlignment::Right),
            Cell::new(money(value(1))).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{}\n{table}", chart.title)
}

fn format_categories(out: &PipelineOutput) -> String {
    if out.summary.by_category.is_empty() {
        return "Profit by category\n(no category column)".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Income", "Expense", "Profit", "Avg profit"]);
    for c in &out.summary.by_category {
        let profit = if c.profit_sum >= 0.0 {
            money(c.profit_sum).green().to_string()
        } else {
            money(c.profit_sum).red().to_string()
        };
        table.add_row(vec![
            Cell::new(&c.category),
            Cell::new(c.count),
            Cell::new(money(c.income_sum)),
            Cell::new(money(c.expense_sum)),
            Cell::new(profit),
            Cell::new(money(c.profit_mean)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(out.summary.count),
        Cell::new(money(out.summary.total_income)),
        Cell::new(money(out.summary.total_expense)),
        Cell::new(money(out.summary.total_profit)),
        Cell::new(""),
    ]);
    format!("Profit by category\n{table}")
}

fn format_records(dash: &Dashboard) -> String {
    let view = &dash.table;
    if view.rows.is_empty() {
        return "Records\n(no rows with positive profit)".to_string();
    }
    let mut table = Table::new();
    table.set_header(&view.headers);
    for row in &view.rows {
        table.add_row(row.iter().enumerate().map(|(i, cell)| {
            let c = Cell::new(cell);
            if view.numeric.get(i).copied().unwrap_or(false) {
                c.set_alignment(CellAlignment::Right)
            } else {
                c
            }
        }));
    }
    format!("Records\n{table}")
}
