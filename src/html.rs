//! Self-contained HTML page for a rendered dashboard: themed stylesheet,
//! metric cards, SVG charts drawn with plotters and the data table.

use std::ops::Range;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::error::{Result, TableroError};
use crate::fmt::format_k;
use crate::importer::UploadInfo;
use crate::render::{BarChart, Dashboard, LineChart, Rendered, Stroke, TableView, Trend};
use crate::theme::{hex_rgb, stylesheet, Theme};

const CHART_SIZE: (u32, u32) = (800, 300);
const TITLE: &str = "Dashboard Financiero";

fn chart_err(e: impl std::fmt::Display) -> TableroError {
    TableroError::Chart(e.to_string())
}

fn rgb(hex: &str) -> RGBColor {
    let (r, g, b) = hex_rgb(hex).unwrap_or((0, 0, 0));
    RGBColor(r, g, b)
}

/// Vertical range covering every value and zero, padded by a tenth.
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (mut min, mut max) = (0.0f64, 0.0f64);
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if max == min {
        max = min + 1.0;
    }
    let pad = (max - min) * 0.1;
    let low = if min < 0.0 { min - pad } else { min };
    low..max + pad
}

/// Income and expense over time. Solid, dashed and filled series map to
/// `LineSeries`, `DashedLineSeries` and `AreaSeries`.
pub fn line_chart_svg(chart: &LineChart, background: &str, text: &str) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&rgb(background)).map_err(chart_err)?;

        let text_color = rgb(text);
        let grid = rgb(chart.grid_color);
        let last = chart.x.len().saturating_sub(1).max(1) as i32;
        let y = value_range(chart.series.iter().flat_map(|s| s.values.iter().copied()));

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title, ("sans-serif", 16).into_font().color(&text_color))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0..last, y)
            .map_err(chart_err)?;

        let month = |i: &i32| {
            chart
                .x
                .get(*i as usize)
                .map(|d| d.get(..7).unwrap_or(d).to_string())
                .unwrap_or_default()
        };
        ctx.configure_mesh()
            .x_labels(chart.x.len().min(12))
            .x_label_formatter(&month)
            .y_labels(5)
            .y_label_formatter(&|v: &f64| format_k(*v))
            .label_style(("sans-serif", 11).into_font().color(&text_color))
            .axis_style(grid.stroke_width(1))
            .bold_line_style(grid.stroke_width(1))
            .light_line_style(TRANSPARENT.stroke_width(0))
            .draw()
            .map_err(chart_err)?;

        for series in &chart.series {
            let color = rgb(series.color);
            let points: Vec<(i32, f64)> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as i32, *v))
                .collect();
            if series.fill {
                ctx.draw_series(
                    AreaSeries::new(points.iter().copied(), 0.0, color.mix(0.2))
                        .border_style(TRANSPARENT.stroke_width(0)),
                )
                .map_err(chart_err)?;
            }
            let line = points.iter().copied();
            let anno = match series.stroke {
                Stroke::Solid => ctx.draw_series(LineSeries::new(line, color.stroke_width(2))),
                Stroke::Dashed => {
                    ctx.draw_series(DashedLineSeries::new(line, 6, 4, color.stroke_width(2)))
                }
            }
            .map_err(chart_err)?;
            anno.label(series.name).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
        }

        ctx.configure_series_labels()
            .label_font(("sans-serif", 11).into_font().color(&text_color))
            .background_style(rgb(background).mix(0.8))
            .border_style(grid)
            .draw()
            .map_err(chart_err)?;
        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

/// Profit per category, one segment per bar. Bars grow down from zero for
/// negative values.
pub fn bar_chart_svg(chart: &BarChart, background: &str, text: &str) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&rgb(background)).map_err(chart_err)?;

        let text_color = rgb(text);
        let grid = rgb(chart.grid_color);
        let n = chart.bars.len().max(1) as i32;
        let y = value_range(chart.bars.iter().map(|b| b.value));

        let mut ctx = ChartBuilder::on(&root)
            .caption(chart.title, ("sans-serif", 16).into_font().color(&text_color))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), y)
            .map_err(chart_err)?;

        let label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(i) => chart
                .bars
                .get(*i as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(chart.bars.len().max(1))
            .x_label_formatter(&label)
            .y_labels(5)
            .y_label_formatter(&|v: &f64| format_k(*v))
            .label_style(("sans-serif", 11).into_font().color(&text_color))
            .axis_style(grid.stroke_width(1))
            .bold_line_style(grid.stroke_width(1))
            .light_line_style(TRANSPARENT.stroke_width(0))
            .draw()
            .map_err(chart_err)?;

        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let i = i as i32;
            let mut rect = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.value)],
                rgb(bar.color).filled(),
            );
            rect.set_margin(0, 0, 12, 12);
            rect
        }))
        .map_err(chart_err)?;
        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn trend_marker(trend: Option<Trend>) -> (&'static str, &'static str) {
    match trend {
        Some(Trend::Up) => ("value trend-up", " \u{25b2}"),
        Some(Trend::Down) => ("value trend-down", " \u{25bc}"),
        None => ("value", ""),
    }
}

fn table_markup(table: &TableView) -> Markup {
    html! {
        table {
            thead { tr { @for h in &table.headers { th { (h) } } } }
            tbody {
                @for row in &table.rows {
                    tr {
                        @for (i, cell) in row.iter().enumerate() {
                            @if table.numeric.get(i).copied().unwrap_or(false) {
                                td class="num" { (cell) }
                            } @else {
                                td { (cell) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn dashboard_markup(dash: &Dashboard) -> Result<Markup> {
    let (background, text) = (dash.palette.background, dash.palette.text);
    let line = line_chart_svg(&dash.line_chart, background, text)?;
    let bars = bar_chart_svg(&dash.bar_chart, background, text)?;
    Ok(html! {
        section class="metrics" {
            @for card in &dash.metrics {
                @let (class, arrow) = trend_marker(card.trend);
                div class="metric" {
                    div class="label" { (card.label) }
                    div class=(class) { (card.value) (arrow) }
                }
            }
        }
        section { (PreEscaped(line)) }
        section { (PreEscaped(bars)) }
        h2 { "Records" }
        section { (table_markup(&dash.table)) }
    })
}

/// Full page. `notice` is an upload failure message shown above the content.
pub fn page(
    rendered: &Rendered,
    theme: Theme,
    upload: Option<&UploadInfo>,
    notice: Option<&str>,
) -> Result<String> {
    let content = match rendered {
        Rendered::Dashboard(dash) => dashboard_markup(dash)?,
        Rendered::Empty { notice } => html! { p class="notice" { (notice) } },
    };
    let markup = html! {
        (DOCTYPE)
        html lang="es" {
            head {
                meta charset="utf-8";
                title { (TITLE) }
                style { (PreEscaped(stylesheet(theme))) }
            }
            body {
                h1 { (TITLE) }
                @if let Some(info) = upload {
                    p { "Source: " (info.name) " (" (info.size) " bytes)" }
                }
                @if let Some(msg) = notice {
                    p class="notice" { (msg) }
                }
                (content)
            }
        }
    };
    Ok(format!("{}\n", markup.into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Bar, Series};
    use crate::theme::resolve;

    fn line_chart(fill: bool) -> LineChart {
        let p = resolve(Theme::Dark);
        LineChart {
            title: "Monthly income and expense",
            x: vec!["2024-01-01".into(), "2024-02-01".into(), "2024-03-01".into()],
            series: vec![
                Series {
                    name: "income",
                    color: p.primary,
                    stroke: Stroke::Solid,
                    fill,
                    values: vec![100.0, 200.0, 150.0],
                },
                Series {
                    name: "expense",
                    color: p.secondary,
                    stroke: Stroke::Dashed,
                    fill: false,
                    values: vec![50.0, 80.0, 60.0],
                },
            ],
            grid_color: p.grid,
        }
    }

    #[test]
    fn test_value_range_includes_zero_and_negatives() {
        let r = value_range([100.0, 300.0].into_iter());
        assert_eq!(r.start, 0.0);
        assert!(r.end > 300.0);
        let r = value_range([-100.0, 300.0].into_iter());
        assert!(r.start < -100.0);
        let r = value_range(std::iter::empty());
        assert_eq!(r.start, 0.0);
        assert!(r.end > 1.0);
    }

    #[test]
    fn test_line_chart_styles() {
        let p = resolve(Theme::Dark);
        let svg = line_chart_svg(&line_chart(true), p.background, p.text).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polygon").count(), 1);
        // The dashed series is drawn as several short segments.
        assert!(svg.matches("<polyline").count() > 2);
        assert!(svg.contains("2024-01"));
        assert!(svg.contains("income"));
        assert!(svg.to_lowercase().contains(p.primary));
    }

    #[test]
    fn test_line_chart_without_fill_has_no_area() {
        let p = resolve(Theme::Light);
        let svg = line_chart_svg(&line_chart(false), p.background, p.text).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 0);
    }

    #[test]
    fn test_bar_chart_handles_negative_values() {
        let p = resolve(Theme::Light);
        let chart = BarChart {
            title: "Profit by category",
            bars: vec![
                Bar { label: "Sales".into(), value: 300.0, color: p.positive },
                Bar { label: "Services".into(), value: -100.0, color: p.negative },
            ],
            grid_color: p.grid,
        };
        let svg = bar_chart_svg(&chart, p.background, p.text).unwrap();
        let lower = svg.to_lowercase();
        assert!(lower.contains(p.positive));
        assert!(lower.contains(p.negative));
        assert!(svg.contains("Sales"));
        assert!(svg.contains("Services"));
        assert!(!svg.contains("height=\"-"));
    }

    #[test]
    fn test_empty_page_shows_notice() {
        let rendered = Rendered::Empty {
            notice: "nothing here".into(),
        };
        let html = page(&rendered, Theme::Dark, None, Some("Error reading x.xlsx: bad")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("nothing here"));
        assert!(html.contains("Error reading x.xlsx"));
        assert!(html.contains("#111111"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_page_escapes_upload_name() {
        let rendered = Rendered::Empty {
            notice: "none".into(),
        };
        let info = UploadInfo {
            name: "<script>.csv".into(),
            size: 3,
        };
        let html = page(&rendered, Theme::Light, Some(&info), None).unwrap();
        assert!(html.contains("&lt;script&gt;.csv (3 bytes)"));
        assert!(!html.contains("<script>"));
    }
}
