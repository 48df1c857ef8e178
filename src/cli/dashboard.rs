use std::path::PathBuf;

use chrono::{Months, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table,
    },
    Frame,
};

use crate::cli::export::write_filtered;
use crate::cli::SelectionArgs;
use crate::controls::Selections;
use crate::error::Result;
use crate::fmt::format_k;
use crate::models::Column;
use crate::pipeline::{self, load_source, PipelineOutput, Source};
use crate::render::{Dashboard as DashboardModel, Rendered, Stroke, Trend};
use crate::settings::{load_settings, save_settings, Settings};
use crate::tui::{run_view, wrap_text, Styles, View, ViewAction};

const HINTS: &str = " \u{2190}/\u{2192}=months  [/]=year  \u{2191}/\u{2193}=min income  t=theme  r=region  1-9=category  ,/.=from  </>=to  p=positive  a=fill  s=reseed  c=clear  e=export  q=quit";

pub struct DashboardView {
    selections: Selections,
    file: Option<PathBuf>,
    /// Seed for synthetic data when none was given on the command line.
    session_seed: u64,
    export_dir: String,
    source: Source,
    output: PipelineOutput,
    table_offset: usize,
    status_message: Option<String>,
}

impl DashboardView {
    pub fn new(selections: Selections, file: Option<PathBuf>, export_dir: String) -> Result<Self> {
        let session_seed = selections.seed.unwrap_or_else(rand::random);
        let source = Self::load(&selections, session_seed, file.as_ref())?;
        let output = pipeline::run(&source.records, &selections);
        let status_message = source.notice.clone();
        Ok(Self {
            selections,
            file,
            session_seed,
            export_dir,
            source,
            output,
            table_offset: 0,
            status_message,
        })
    }

    fn load(selections: &Selections, seed: u64, file: Option<&PathBuf>) -> Result<Source> {
        let seeded = Selections {
            seed: Some(seed),
            ..selections.clone()
        };
        load_source(&seeded, file.map(PathBuf::as_path))
    }

    /// Rebuild everything from the current selections.
    fn refresh(&mut self) {
        match Self::load(&self.selections, self.session_seed, self.file.as_ref()) {
            Ok(source) => {
                if source.notice.is_some() {
                    self.status_message = source.notice.clone();
                }
                self.source = source;
            }
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
        self.output = pipeline::run(&self.source.records, &self.selections);
        let rows = self.output.rendered.dashboard().map_or(0, |d| d.table.rows.len());
        self.table_offset = self.table_offset.min(rows.saturating_sub(1));
    }

    fn categories(&self) -> Vec<String> {
        self.source.records.distinct(Column::Category)
    }

    fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.source.records.records.iter().filter_map(|r| r.date);
        let min = dates.clone().min()?;
        let max = dates.max()?;
        Some((min, max))
    }

    fn step_from(&mut self, delta: i32) {
        let Some((min, _)) = self.date_bounds() else {
            return;
        };
        let next = shift_months(self.selections.from.unwrap_or(min), delta);
        if self.selections.to.map_or(true, |to| next <= to) {
            self.selections.from = Some(next);
        }
    }

    fn step_to(&mut self, delta: i32) {
        let Some((_, max)) = self.date_bounds() else {
            return;
        };
        let next = shift_months(self.selections.to.unwrap_or(max), delta);
        if self.selections.from.map_or(true, |from| next >= from) {
            self.selections.to = Some(next);
        }
    }

    fn clear_filters(&mut self) {
        self.selections.min_income = 0.0;
        self.selections.region = None;
        self.selections.categories = None;
        self.selections.from = None;
        self.selections.to = None;
        self.selections.positive_only = false;
    }

    fn export(&mut self) {
        self.status_message = Some(
            match write_filtered(&self.output.filtered, None, &self.export_dir) {
                Ok(path) => format!("Wrote {}", path.display()),
                Err(e) => format!("Export failed: {e}"),
            },
        );
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_metrics(frame: &mut Frame, area: Rect, dash: &DashboardModel, styles: &Styles) {
        let cols = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        for (card, col) in dash.metrics.iter().zip(cols.iter()) {
            let (value_style, arrow) = match card.trend {
                Some(Trend::Up) => (styles.positive, " \u{25b2}"),
                Some(Trend::Down) => (styles.negative, " \u{25bc}"),
                None => (styles.base.add_modifier(Modifier::BOLD), ""),
            };
            let lines = vec![
                Line::from(Span::styled(format!(" {}", card.label), styles.footer)),
                Line::from(Span::styled(format!(" {}{arrow}", card.value), value_style)),
            ];
            frame.render_widget(Paragraph::new(lines).style(styles.base), *col);
        }
    }

    fn draw_line_chart(frame: &mut Frame, area: Rect, dash: &DashboardModel, styles: &Styles) {
        let chart = &dash.line_chart;
        let points: Vec<Vec<(f64, f64)>> = chart
            .series
            .iter()
            .map(|s| {
                s.values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, *v))
                    .collect()
            })
            .collect();

        let max = chart
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0f64, f64::max);
        let min = chart
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0f64, f64::min);
        let (top, mid) = y_axis_ticks(max);

        let mut datasets = Vec::new();
        for (series, data) in chart.series.iter().zip(points.iter()) {
            let color = crate::tui::color(series.color);
            if series.fill {
                datasets.push(
                    Dataset::default()
                        .marker(Marker::Braille)
                        .graph_type(GraphType::Bar)
                        .style(Style::new().fg(color).add_modifier(Modifier::DIM))
                        .data(data),
                );
            }
            let marker = match series.stroke {
                Stroke::Solid => Marker::Braille,
                Stroke::Dashed => Marker::Dot,
            };
            datasets.push(
                Dataset::default()
                    .name(series.name)
                    .marker(marker)
                    .graph_type(GraphType::Line)
                    .style(Style::new().fg(color))
                    .data(data),
            );
        }

        let n = chart.x.len();
        let x_labels: Vec<String> = match n {
            0 => vec![],
            1 => vec![chart.x[0].clone()],
            _ => vec![
                chart.x[0].clone(),
                chart.x[n / 2].clone(),
                chart.x[n - 1].clone(),
            ],
        };
        let widget = Chart::new(datasets)
            .block(
                Block::default()
                    .title(chart.title)
                    .title_style(styles.header)
                    .borders(Borders::NONE),
            )
            .style(styles.base)
            .x_axis(
                Axis::default()
                    .bounds([0.0, n.saturating_sub(1).max(1) as f64])
                    .labels(x_labels)
                    .style(Style::new().fg(styles.grid)),
            )
            .y_axis(
                Axis::default()
                    .bounds([min.min(0.0), top])
                    .labels(vec![format_k(min.min(0.0)), format_k(mid), format_k(top)])
                    .style(Style::new().fg(styles.grid)),
            );
        frame.render_widget(widget, area);
    }

    fn draw_bar_chart(frame: &mut Frame, area: Rect, dash: &DashboardModel, styles: &Styles) {
        let chart = &dash.bar_chart;
        let bars: Vec<Bar> = chart
            .bars
            .iter()
            .map(|b| {
                let style = Style::new().fg(crate::tui::color(b.color));
                Bar::default()
                    .value(b.value.abs().round() as u64)
                    .text_value(format_k(b.value))
                    .label(Line::from(b.label.clone()))
                    .style(style)
                    .value_style(style.add_modifier(Modifier::REVERSED))
            })
            .collect();
        let slots = bars.len().max(1) as u16;
        let bar_width = (area.width.saturating_sub(slots) / slots).clamp(3, 12);
        let widget = BarChart::default()
            .block(
                Block::default()
                    .title(chart.title)
                    .title_style(styles.header)
                    .borders(Borders::NONE),
            )
            .style(styles.base)
            .bar_width(bar_width)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(widget, area);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect, dash: &DashboardModel, styles: &Styles) {
        let view = &dash.table;
        let header = Row::new(view.headers.iter().map(|h| Cell::from(h.as_str()))).style(styles.header);
        let visible = area.height.saturating_sub(2) as usize;
        let rows: Vec<Row> = view
            .rows
            .iter()
            .skip(self.table_offset)
            .take(visible)
            .map(|row| {
                Row::new(row.iter().enumerate().map(|(i, cell)| {
                    let text = Text::from(cell.as_str());
                    if view.numeric.get(i).copied().unwrap_or(false) {
                        Cell::from(text.alignment(Alignment::Right))
                    } else {
                        Cell::from(text)
                    }
                }))
            })
            .collect();
        let widths = vec![Constraint::Fill(1); view.headers.len()];
        let title = format!(
            "Records {}-{} of {}",
            (self.table_offset + 1).min(view.rows.len()),
            (self.table_offset + visible).min(view.rows.len()),
            view.rows.len()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().title(title).title_style(styles.header))
            .style(styles.base);
        frame.render_widget(table, area);
    }

    fn controls_lines(&self, styles: &Styles) -> Vec<Line<'static>> {
        let s = &self.selections;
        let source = match &self.source.upload {
            Some(info) => format!("{} ({} bytes)", info.name, info.size),
            None => format!("synthetic, {} months from {}", s.months, s.year),
        };
        let range = match (s.from, s.to) {
            (None, None) => "all dates".to_string(),
            (from, to) => format!(
                "{} .. {}",
                from.map_or("start".to_string(), |d| d.to_string()),
                to.map_or("end".to_string(), |d| d.to_string())
            ),
        };
        let first = Line::from(vec![Span::styled(
            format!(
                " Tema: {}  Fuente: {source}  Ingreso min: {}  Region: {}  Fechas: {range}  Positivos: {}  Relleno: {}",
                s.theme.option(),
                format_k(s.min_income),
                s.region.as_deref().unwrap_or("all"),
                if s.positive_only { "on" } else { "off" },
                if s.area_fill() { "on" } else { "off" },
            ),
            styles.base,
        )]);

        let mut spans = vec![Span::styled(" Categorias: ", styles.base)];
        for (i, cat) in self.categories().iter().enumerate() {
            let style = if s.is_category_selected(cat) {
                styles.selected
            } else {
                styles.footer
            };
            spans.push(Span::styled(format!("{} {cat}", i + 1), style));
            spans.push(Span::styled(" ", styles.base));
        }
        vec![first, Line::from(spans)]
    }
}

impl View for DashboardView {
    fn draw(&mut self, frame: &mut Frame) {
        let styles = Styles::from_palette(&self.output.palette);
        let area = frame.area();
        frame.render_widget(Block::default().style(styles.base), area);

        let (hint_text, hint_style) = match &self.status_message {
            Some(msg) => (format!(" {msg}"), styles.base.fg(styles.secondary)),
            None => (HINTS.to_string(), styles.footer),
        };
        let (hint_text, hint_lines) = wrap_text(&hint_text, area.width as usize);

        let [header_area, sep1, metrics_area, charts_area, table_area, sep2, controls_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Fill(2),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(hint_lines),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(" Dashboard Financiero").style(styles.header),
            header_area,
        );
        let sep_line = "\u{2501}".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(styles.footer);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget, sep2);

        match &self.output.rendered {
            Rendered::Dashboard(dash) => {
                Self::draw_metrics(frame, metrics_area, dash, &styles);
                let [line_area, bar_area] =
                    Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .areas(charts_area);
                Self::draw_line_chart(frame, line_area, dash, &styles);
                Self::draw_bar_chart(frame, bar_area, dash, &styles);
                self.draw_table(frame, table_area, dash, &styles);
            }
            Rendered::Empty { notice } => {
                frame.render_widget(
                    Paragraph::new(format!(" {notice}")).style(styles.negative),
                    charts_area,
                );
            }
        }

        frame.render_widget(Paragraph::new(self.controls_lines(&styles)), controls_area);

        frame.render_widget(Paragraph::new(hint_text).style(hint_style), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Left => self.selections.step_months(-1),
            KeyCode::Right => self.selections.step_months(1),
            KeyCode::Char('[') => self.selections.step_year(-1),
            KeyCode::Char(']') => self.selections.step_year(1),
            KeyCode::Up => self.selections.step_min_income(1),
            KeyCode::Down => self.selections.step_min_income(-1),
            KeyCode::Char('t') => self.selections.theme = self.selections.theme.toggled(),
            KeyCode::Char('r') => {
                let regions = self.source.records.distinct(Column::Region);
                self.selections.cycle_region(&regions);
            }
            KeyCode::Char(c @ '1'..='9') => {
                let all = self.categories();
                let idx = c as usize - '1' as usize;
                if let Some(cat) = all.get(idx).cloned() {
                    self.selections.toggle_category(&cat, &all);
                }
            }
            KeyCode::Char(',') => self.step_from(-1),
            KeyCode::Char('.') => self.step_from(1),
            KeyCode::Char('<') => self.step_to(-1),
            KeyCode::Char('>') => self.step_to(1),
            KeyCode::Char('p') => self.selections.positive_only = !self.selections.positive_only,
            KeyCode::Char('a') => {
                let next = !self.selections.area_fill();
                self.selections.area_fill = Some(next);
            }
            KeyCode::Char('s') => self.session_seed = rand::random(),
            KeyCode::Char('c') => self.clear_filters(),
            KeyCode::Char('e') => {
                self.export();
                return ViewAction::Continue;
            }
            KeyCode::PageDown => self.table_offset += 10,
            KeyCode::PageUp => self.table_offset = self.table_offset.saturating_sub(10),
            _ => return ViewAction::Continue,
        }
        self.refresh();
        ViewAction::Continue
    }
}

/// Pick a round top tick (and its half) at or above the largest value.
fn y_axis_ticks(max_val: f64) -> (f64, f64) {
    let steps = [
        1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0, 250000.0, 500000.0,
        1000000.0, 2500000.0, 5000000.0, 10000000.0,
    ];
    let top = steps
        .iter()
        .copied()
        .find(|&s| s >= max_val)
        .unwrap_or(max_val);
    (top, top / 2.0)
}

fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.unwrap_or(date)
}

pub fn run(selection: &SelectionArgs) -> Result<()> {
    let settings = load_settings();
    let selections = selection.merge(settings.selections.clone())?;
    let mut view = DashboardView::new(selections, selection.file_path(), settings.export_dir.clone())?;
    run_view(&mut view)?;

    save_settings(&Settings {
        selections: view.selections().clone(),
        ..settings
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn view() -> DashboardView {
        let selections = Selections {
            seed: Some(11),
            ..Default::default()
        };
        DashboardView::new(selections, None, std::env::temp_dir().to_string_lossy().to_string())
            .unwrap()
    }

    #[test]
    fn test_keys_step_controls() {
        let mut v = view();
        v.handle_key(KeyCode::Right);
        assert_eq!(v.selections.months, 13);
        assert_eq!(v.source.records.len(), 52);
        v.handle_key(KeyCode::Char(']'));
        assert_eq!(v.selections.year, 2025);
        v.handle_key(KeyCode::Up);
        v.handle_key(KeyCode::Up);
        assert_eq!(v.selections.min_income, 1000.0);
        v.handle_key(KeyCode::Char('t'));
        assert_eq!(v.selections.theme, Theme::Dark);
        assert_eq!(v.output.palette, crate::theme::resolve(Theme::Dark));
    }

    #[test]
    fn test_months_clamp_at_bounds() {
        let mut v = view();
        for _ in 0..30 {
            v.handle_key(KeyCode::Left);
        }
        assert_eq!(v.selections.months, crate::controls::MONTHS_MIN);
    }

    #[test]
    fn test_same_seed_keeps_data_between_keys() {
        let mut v = view();
        let before = v.source.records.clone();
        v.handle_key(KeyCode::Char('p'));
        assert_eq!(v.source.records, before);
        v.handle_key(KeyCode::Char('s'));
        assert_ne!(v.source.records, before);
    }

    #[test]
    fn test_category_toggle_filters() {
        let mut v = view();
        v.handle_key(KeyCode::Char('1'));
        let first = v.categories()[0].clone();
        assert!(!v.selections.is_category_selected(&first));
        assert!(v
            .output
            .filtered
            .records
            .iter()
            .all(|r| r.category.as_deref() != Some(first.as_str())));
        v.handle_key(KeyCode::Char('1'));
        assert!(v.selections.categories.is_none());
    }

    #[test]
    fn test_region_cycle_and_clear() {
        let mut v = view();
        v.handle_key(KeyCode::Char('r'));
        assert_eq!(v.selections.region.as_deref(), Some("East"));
        v.handle_key(KeyCode::Char('c'));
        assert!(v.selections.region.is_none());
    }

    #[test]
    fn test_date_range_keys() {
        let mut v = view();
        v.handle_key(KeyCode::Char('.'));
        assert_eq!(v.selections.from, NaiveDate::from_ymd_opt(2024, 2, 1));
        v.handle_key(KeyCode::Char('<'));
        assert_eq!(v.selections.to, NaiveDate::from_ymd_opt(2024, 11, 1));
        assert_eq!(v.output.summary.count, 40);
    }

    #[test]
    fn test_empty_state_and_quit() {
        let mut v = view();
        v.selections.min_income = 49_500.0;
        v.handle_key(KeyCode::Up);
        assert!(matches!(v.output.rendered, Rendered::Empty { .. }));
        assert!(matches!(v.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }

    #[test]
    fn test_draws_without_panic() {
        let mut v = view();
        let mut terminal = Terminal::new(TestBackend::new(160, 48)).unwrap();
        terminal.draw(|f| v.draw(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Dashboard Financiero"));
        assert!(text.contains("Net profit"));

        v.handle_key(KeyCode::Char('t'));
        v.selections.min_income = 50_000.0;
        v.refresh();
        terminal.draw(|f| v.draw(f)).unwrap();
    }

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks(4200.0), (5000.0, 2500.0));
        assert_eq!(y_axis_ticks(0.0), (1000.0, 500.0));
    }

    #[test]
    fn test_shift_months() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(shift_months(d, -1), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(shift_months(d, 2), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
