pub mod completions;
pub mod dashboard;
pub mod export;
pub mod report;

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::controls::Selections;
use crate::error::Result;
use crate::pipeline::{load_source, Source};
use crate::settings::{load_settings, shellexpand_path};
use crate::theme::Theme;

#[derive(Parser)]
#[command(name = "tablero", about = "Financial dashboard for synthetic or uploaded records.")]
pub struct Cli {
    /// Log verbosity (off, error, warn, info, debug, trace). RUST_LOG overrides.
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard.
    Dashboard {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Render one dashboard pass as text, JSON or HTML.
    Report {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// Download the filtered records as CSV.
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output path (default: <export_dir>/datos_filtrados_YYYYMMDD_HHMM.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Download the example upload template.
    Template {
        /// Output path; prints to stdout when omitted
        #[arg(long)]
        output: Option<String>,
    },
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Html,
}

/// Widget selections given on the command line. Anything omitted keeps the
/// value from the last saved session.
#[derive(Args, Clone, Debug, Default)]
pub struct SelectionArgs {
    /// CSV or Excel file to use instead of synthetic data
    #[arg(long)]
    pub file: Option<String>,
    /// Months of synthetic data (3-24)
    #[arg(long)]
    pub months: Option<u32>,
    /// Base year of synthetic data (2022-2025)
    #[arg(long)]
    pub year: Option<i32>,
    /// Seed for reproducible synthetic data
    #[arg(long)]
    pub seed: Option<u64>,
    /// Visual theme: Claro or Oscuro
    #[arg(long)]
    pub theme: Option<Theme>,
    /// Minimum income, 0-50000 in steps of 500
    #[arg(long = "min-income")]
    pub min_income: Option<f64>,
    /// Keep only this region
    #[arg(long)]
    pub region: Option<String>,
    /// Keep only these categories (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long = "from")]
    pub from_date: Option<NaiveDate>,
    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long = "to")]
    pub to_date: Option<NaiveDate>,
    /// Hide table rows with non-positive profit
    #[arg(long = "positive-only")]
    pub positive_only: bool,
    /// Fill the area under the income line (defaults to on for Oscuro)
    #[arg(long = "area-fill")]
    pub area_fill: Option<bool>,
}

impl SelectionArgs {
    /// Overlay command-line values on saved selections and validate.
    pub fn merge(&self, mut base: Selections) -> Result<Selections> {
        if let Some(m) = self.months {
            base.months = m;
        }
        if let Some(y) = self.year {
            base.year = y;
        }
        if self.seed.is_some() {
            base.seed = self.seed;
        }
        if let Some(t) = self.theme {
            base.theme = t;
        }
        if let Some(min) = self.min_income {
            base.min_income = min;
        }
        if self.region.is_some() {
            base.region = self.region.clone();
        }
        if !self.categories.is_empty() {
            base.categories = Some(self.categories.iter().cloned().collect::<BTreeSet<_>>());
        }
        if self.from_date.is_some() {
            base.from = self.from_date;
        }
        if self.to_date.is_some() {
            base.to = self.to_date;
        }
        if self.positive_only {
            base.positive_only = true;
        }
        if self.area_fill.is_some() {
            base.area_fill = self.area_fill;
        }
        base.validate()?;
        Ok(base)
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(|f| PathBuf::from(shellexpand_path(f)))
    }

    /// Saved selections merged with these flags, plus the loaded source.
    pub fn resolve(&self) -> Result<(Selections, Source)> {
        let selections = self.merge(load_settings().selections)?;
        let file = self.file_path();
        let source = load_source(&selections, file.as_deref())?;
        if let Some(notice) = &source.notice {
            eprintln!("{notice}");
        }
        Ok((selections, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{load_settings_from, save_settings_to, Settings};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::try_parse_from([
            "tablero", "report", "--format", "json", "--months", "6", "--theme", "Oscuro",
            "--category", "Sales", "--category", "Products", "--from", "2024-02-01",
        ])
        .unwrap();
        let Commands::Report { selection, format, .. } = cli.command else {
            panic!("expected report");
        };
        assert_eq!(format, ReportFormat::Json);
        let s = selection.merge(Selections::default()).unwrap();
        assert_eq!(s.months, 6);
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.categories.unwrap().len(), 2);
        assert_eq!(s.from, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_merge_keeps_saved_values() {
        let saved = Selections {
            months: 18,
            region: Some("West".into()),
            ..Default::default()
        };
        let args = SelectionArgs {
            year: Some(2023),
            ..Default::default()
        };
        let s = args.merge(saved).unwrap();
        assert_eq!(s.months, 18);
        assert_eq!(s.year, 2023);
        assert_eq!(s.region.as_deref(), Some("West"));
    }

    #[test]
    fn test_seed_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let args = SelectionArgs {
            seed: Some(5),
            ..Default::default()
        };
        let selections = args.merge(Selections::default()).unwrap();
        assert_eq!(selections.seed, Some(5));
        let settings = Settings {
            selections,
            ..Default::default()
        };
        save_settings_to(&path, &settings).unwrap();

        let reloaded = load_settings_from(&path);
        assert_eq!(reloaded.selections.months, 12);
        let next = SelectionArgs::default().merge(reloaded.selections).unwrap();
        assert_eq!(next.seed, None);
    }

    #[test]
    fn test_merge_rejects_out_of_range() {
        let args = SelectionArgs {
            months: Some(30),
            ..Default::default()
        };
        assert!(args.merge(Selections::default()).is_err());
    }

    #[test]
    fn test_log_level_flag() {
        let cli = Cli::try_parse_from(["tablero", "template", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LevelFilter::DEBUG);
    }
}
