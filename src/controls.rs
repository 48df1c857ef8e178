use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableroError};
use crate::filter::FilterCriteria;
use crate::theme::Theme;

pub const MONTHS_MIN: u32 = 3;
pub const MONTHS_MAX: u32 = 24;
pub const YEARS: &[i32] = &[2022, 2023, 2024, 2025];
pub const MIN_INCOME_MAX: f64 = 50_000.0;
pub const MIN_INCOME_STEP: f64 = 500.0;

/// Raw widget selections. Everything downstream is rebuilt from these on
/// every interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selections {
    pub theme: Theme,
    pub months: u32,
    pub year: i32,
    pub min_income: f64,
    pub region: Option<String>,
    /// `None` means every category is selected.
    pub categories: Option<BTreeSet<String>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub positive_only: bool,
    /// Defaults to on for the dark theme when unset.
    pub area_fill: Option<bool>,
    /// Applies to the current run only; never written to settings.
    #[serde(skip)]
    pub seed: Option<u64>,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            months: 12,
            year: 2024,
            min_income: 0.0,
            region: None,
            categories: None,
            from: None,
            to: None,
            positive_only: false,
            area_fill: None,
            seed: None,
        }
    }
}

impl Selections {
    pub fn validate(&self) -> Result<()> {
        if !(MONTHS_MIN..=MONTHS_MAX).contains(&self.months) {
            return Err(TableroError::InvalidSelection(format!(
                "months must be between {MONTHS_MIN} and {MONTHS_MAX}, got {}",
                self.months
            )));
        }
        if !YEARS.contains(&self.year) {
            return Err(TableroError::InvalidSelection(format!(
                "year must be one of {YEARS:?}, got {}",
                self.year
            )));
        }
        if !(0.0..=MIN_INCOME_MAX).contains(&self.min_income)
            || self.min_income % MIN_INCOME_STEP != 0.0
        {
            return Err(TableroError::InvalidSelection(format!(
                "minimum income must be a multiple of {MIN_INCOME_STEP} between 0 and {MIN_INCOME_MAX}, got {}",
                self.min_income
            )));
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(TableroError::InvalidSelection(format!(
                    "start date {from} is after end date {to}"
                )));
            }
        }
        Ok(())
    }

    pub fn area_fill(&self) -> bool {
        self.area_fill.unwrap_or(self.theme.is_dark())
    }

    /// Build filter criteria. A zero minimum filters nothing; an open-ended
    /// date range is bounded by the extremes of the calendar.
    pub fn criteria(&self) -> FilterCriteria {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX))),
        };
        FilterCriteria {
            date_range,
            min_income: (self.min_income > 0.0).then_some(self.min_income),
            region: self.region.clone(),
            categories: self.categories.clone(),
        }
    }

    pub fn step_months(&mut self, delta: i32) {
        let next = self.months as i32 + delta;
        self.months = next.clamp(MONTHS_MIN as i32, MONTHS_MAX as i32) as u32;
    }

    pub fn step_year(&mut self, delta: i32) {
        let idx = YEARS.iter().position(|y| *y == self.year).unwrap_or(0) as i32;
        let next = (idx + delta).clamp(0, YEARS.len() as i32 - 1) as usize;
        self.year = YEARS[next];
    }

    pub fn step_min_income(&mut self, steps: i32) {
        let next = self.min_income + steps as f64 * MIN_INCOME_STEP;
        self.min_income = next.clamp(0.0, MIN_INCOME_MAX);
    }

    /// Advance the single region selection: none -> first -> ... -> last -> none.
    pub fn cycle_region(&mut self, regions: &[String]) {
        self.region = match &self.region {
            None => regions.first().cloned(),
            Some(current) => {
                let idx = regions.iter().position(|r| r == current);
                idx.and_then(|i| regions.get(i + 1)).cloned()
            }
        };
    }

    /// Flip one category in or out of the selection.
    pub fn toggle_category(&mut self, category: &str, all: &[String]) {
        let mut selected = self
            .categories
            .clone()
            .unwrap_or_else(|| all.iter().cloned().collect());
        if !selected.remove(category) {
            selected.insert(category.to_string());
        }
        let everything = all.iter().all(|c| selected.contains(c));
        self.categories = if everything { None } else { Some(selected) };
    }

    pub fn is_category_selected(&self, category: &str) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |set| set.contains(category))
    }
}
