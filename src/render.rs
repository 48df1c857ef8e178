use serde::Serialize;

use crate::fmt::{money, number, table_date};
use crate::models::{Column, RecordSet};
use crate::summary::{time_series, Summary};
use crate::theme::Palette;

pub const EMPTY_NOTICE: &str = "No records match the current filters.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderOptions {
    /// Fill the area under the income line.
    pub area_fill: bool,
    /// Hide table rows whose profit is zero or negative.
    pub positive_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stroke {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: &'static str,
    pub color: &'static str,
    pub stroke: Stroke,
    pub fill: bool,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: &'static str,
    /// ISO dates, one per point.
    pub x: Vec<String>,
    pub series: Vec<Series>,
    pub grid_color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: &'static str,
    pub bars: Vec<Bar>,
    pub grid_color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Per-column flag for right alignment.
    pub numeric: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: [MetricCard; 4],
    pub line_chart: LineChart,
    pub bar_chart: BarChart,
    pub table: TableView,
    pub palette: Palette,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Rendered {
    Dashboard(Box<Dashboard>),
    Empty { notice: String },
}

impl Rendered {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            Self::Dashboard(d) => Some(d),
            Self::Empty { .. } => None,
        }
    }
}

pub fn metric_cards(summary: &Summary) -> [MetricCard; 4] {
    let trend = if summary.total_profit > 0.0 {
        Trend::Up
    } else {
        Trend::Down
    };
    [
        MetricCard {
            label: "Total income",
            value: money(summary.total_income),
            trend: None,
        },
        MetricCard {
            label: "Total expense",
            value: money(summary.total_expense),
            trend: None,
        },
        MetricCard {
            label: "Net profit",
            value: money(summary.total_profit),
            trend: Some(trend),
        },
        MetricCard {
            label: "Records",
            value: number(summary.count as i64),
            trend: None,
        },
    ]
}

pub fn line_chart(records: &RecordSet, palette: &Palette, options: &RenderOptions) -> LineChart {
    let points = time_series(records);
    LineChart {
        title: "Monthly income and expense",
        x: points.iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect(),
        series: vec![
            Series {
                name: "income",
                color: palette.primary,
                stroke: Stroke::Solid,
                fill: options.area_fill,
                values: points.iter().map(|p| p.income).collect(),
            },
            Series {
                name: "expense",
                color: palette.secondary,
                stroke: Stroke::Dashed,
                fill: false,
                values: points.iter().map(|p| p.expense).collect(),
            },
        ],
        grid_color: palette.grid,
    }
}

pub fn bar_chart(summary: &Summary, palette: &Palette) -> BarChart {
    BarChart {
        title: "Profit by category",
        bars: summary
            .by_category
            .iter()
            .map(|c| Bar {
                label: c.category.clone(),
                value: c.profit_sum,
                color: if c.profit_sum >= 0.0 {
                    palette.positive
                } else {
                    palette.negative
                },
            })
            .collect(),
        grid_color: palette.grid,
    }
}

pub fn table(records: &RecordSet, options: &RenderOptions) -> TableView {
    let text_cols: Vec<Column> = [Column::Category, Column::Department, Column::Region]
        .into_iter()
        .filter(|c| records.has(*c))
        .collect();
    let has_date = records.has(Column::Date);

    let mut headers = Vec::new();
    let mut numeric = Vec::new();
    if has_date {
        headers.push(Column::Date.label().to_string());
        numeric.push(false);
    }
    for c in &text_cols {
        headers.push(c.label().to_string());
        numeric.push(false);
    }
    for name in &records.extra_columns {
        headers.push(name.clone());
        numeric.push(false);
    }
    for label in ["Income", "Expense", "Profit"] {
        headers.push(label.to_string());
        numeric.push(true);
    }

    let rows = records
        .records
        .iter()
        .filter(|r| !options.positive_only || r.profit() > 0.0)
        .map(|r| {
            let mut row = Vec::with_capacity(headers.len());
            if has_date {
                row.push(r.date.map(table_date).unwrap_or_default());
            }
            for c in &text_cols {
                let value = match c {
                    Column::Category => r.category.as_deref(),
                    Column::Department => r.department.as_deref(),
                    Column::Region => r.region.as_deref(),
                    _ => None,
                };
                row.push(value.unwrap_or("").to_string());
            }
            for name in &records.extra_columns {
                row.push(r.extra.get(name).cloned().unwrap_or_default());
            }
            row.push(money(r.income));
            row.push(money(r.expense));
            row.push(money(r.profit()));
            row
        })
        .collect();

    TableView {
        headers,
        rows,
        numeric,
    }
}

pub fn render(
    records: &RecordSet,
    summary: &Summary,
    palette: &Palette,
    options: &RenderOptions,
) -> Rendered {
    if records.is_empty() {
        return Rendered::Empty {
            notice: EMPTY_NOTICE.to_string(),
        };
    }
    Rendered::Dashboard(Box::new(Dashboard {
        metrics: metric_cards(summary),
        line_chart: line_chart(records, palette, options),
        bar_chart: bar_chart(summary, palette),
        table: table(records, options),
        palette: *palette,
    }))
}
