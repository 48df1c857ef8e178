use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Column, RecordSet};

/// Per-category totals. Only emitted for groups with at least one record,
/// so the means are always defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub count: usize,
    pub income_sum: f64,
    pub income_mean: f64,
    pub expense_sum: f64,
    pub expense_mean: f64,
    pub profit_sum: f64,
    pub profit_mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub total_profit: f64,
    pub count: usize,
    pub by_category: Vec<CategoryBreakdown>,
}

/// Income and expense summed across categories for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatePoint {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
}

#[derive(Default)]
struct Acc {
    count: usize,
    income: f64,
    expense: f64,
}

pub fn summarize(records: &RecordSet) -> Summary {
    let total_income: f64 = records.records.iter().map(|r| r.income).sum();
    let total_expense: f64 = records.records.iter().map(|r| r.expense).sum();

    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    if records.has(Column::Category) {
        for r in &records.records {
            let Some(category) = r.category.as_deref() else {
                continue;
            };
            let acc = groups.entry(category).or_default();
            acc.count += 1;
            acc.income += r.income;
            acc.expense += r.expense;
        }
    }

    let by_category = groups
        .into_iter()
        .map(|(category, acc)| {
            let n = acc.count as f64;
            let profit = acc.income - acc.expense;
            CategoryBreakdown {
                category: category.to_string(),
                count: acc.count,
                income_sum: acc.income,
                income_mean: acc.income / n,
                expense_sum: acc.expense,
                expense_mean: acc.expense / n,
                profit_sum: profit,
                profit_mean: profit / n,
            }
        })
        .collect();

    Summary {
        total_income,
        total_expense,
        total_profit: total_income - total_expense,
        count: records.len(),
        by_category,
    }
}

/// Per-date totals in ascending date order. Undated rows are skipped.
pub fn time_series(records: &RecordSet) -> Vec<DatePoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for r in &records.records {
        let Some(date) = r.date else { continue };
        let entry = by_date.entry(date).or_default();
        entry.0 += r.income;
        entry.1 += r.expense;
    }
    by_date
        .into_iter()
        .map(|(date, (income, expense))| DatePoint {
            date,
            income,
            expense,
        })
        .collect()
}
