use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Column, Record, RecordSet};

/// Snapshot of the user's filter selections. An unset field filters nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive calendar-date range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub min_income: Option<f64>,
    pub region: Option<String>,
    pub categories: Option<BTreeSet<String>>,
}

/// A single criterion, bound to the columns of the set it runs against.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    DateRange(NaiveDate, NaiveDate),
    MinIncome(f64),
    Region(String),
    Categories(BTreeSet<String>),
}

impl Predicate {
    /// The column this predicate reads. Without it the predicate is skipped.
    pub fn column(&self) -> Column {
        match self {
            Self::DateRange(..) => Column::Date,
            Self::MinIncome(_) => Column::Income,
            Self::Region(_) => Column::Region,
            Self::Categories(_) => Column::Category,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::DateRange(start, end) => record
                .date
                .map_or(false, |d| *start <= d && d <= *end),
            Self::MinIncome(min) => record.income >= *min,
            Self::Region(region) => record.region.as_deref() == Some(region.as_str()),
            Self::Categories(set) => record
                .category
                .as_ref()
                .map_or(false, |c| set.contains(c)),
        }
    }

    /// Keep the rows this predicate accepts; a no-op when the column is missing.
    pub fn apply(&self, records: &RecordSet) -> RecordSet {
        if !records.has(self.column()) {
            return records.clone();
        }
        let mut out = records.empty_like();
        out.records = records
            .records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        out
    }
}

impl FilterCriteria {
    pub fn is_unset(&self) -> bool {
        self.predicates().is_empty()
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some((start, end)) = self.date_range {
            preds.push(Predicate::DateRange(start, end));
        }
        if let Some(min) = self.min_income {
            preds.push(Predicate::MinIncome(min));
        }
        if let Some(region) = &self.region {
            preds.push(Predicate::Region(region.clone()));
        }
        if let Some(categories) = &self.categories {
            preds.push(Predicate::Categories(categories.clone()));
        }
        preds
    }
}

/// Conjunction of every criterion that is set and whose column is present.
pub fn apply(records: &RecordSet, criteria: &FilterCriteria) -> RecordSet {
    let predicates = criteria.predicates();
    let out = predicates
        .iter()
        .fold(records.clone(), |acc, p| p.apply(&acc));

    tracing::debug!(
        before = records.len(),
        after = out.len(),
        predicates = predicates.len(),
        "applied filters"
    );
    out
}
