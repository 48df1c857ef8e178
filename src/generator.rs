use chrono::{Months, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Column, Record, RecordSet};

pub const CATEGORIES: &[&str] = &["Sales", "Services", "Consulting", "Products"];
pub const DEPARTMENTS: &[&str] = &["Marketing", "Operations", "Finance", "Technology"];
pub const REGIONS: &[&str] = &["North", "South", "East", "West"];

/// Half-open ranges for the drawn amounts.
const INCOME_RANGE: std::ops::Range<i64> = 2000..8000;
const EXPENSE_RANGE: std::ops::Range<i64> = 1000..6000;

/// Build `period_count` months of synthetic records starting at
/// `base_year`-01-01, one record per category per month.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, period_count: u32, base_year: i32) -> RecordSet {
    let mut records = Vec::with_capacity(period_count as usize * CATEGORIES.len());
    let Some(start) = NaiveDate::from_ymd_opt(base_year, 1, 1) else {
        return RecordSet::new(Column::ALL, records);
    };

    for i in 0..period_count {
        let Some(date) = start.checked_add_months(Months::new(i)) else {
            break;
        };
        for category in CATEGORIES {
            let department = DEPARTMENTS.choose(rng).copied().unwrap_or(DEPARTMENTS[0]);
            let region = REGIONS.choose(rng).copied().unwrap_or(REGIONS[0]);
            records.push(Record {
                date: Some(date),
                category: Some(category.to_string()),
                department: Some(department.to_string()),
                region: Some(region.to_string()),
                income: rng.gen_range(INCOME_RANGE) as f64,
                expense: rng.gen_range(EXPENSE_RANGE) as f64,
                extra: Default::default(),
            });
        }
    }

    tracing::debug!(
        records = records.len(),
        period_count,
        base_year,
        "generated synthetic records"
    );
    RecordSet::new(Column::ALL, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_twelve_months_four_categories() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = generate(&mut rng, 12, 2024);
        assert_eq!(set.len(), 48);

        for month in 1..=12u32 {
            let in_month: Vec<_> = set
                .records
                .iter()
                .filter(|r| r.date.map(|d| d.month()) == Some(month))
                .collect();
            assert_eq!(in_month.len(), 4, "month {month}");
            for category in CATEGORIES {
                assert_eq!(
                    in_month
                        .iter()
                        .filter(|r| r.category.as_deref() == Some(*category))
                        .count(),
                    1
                );
            }
        }
        assert!(set.records.iter().all(|r| r.date.unwrap().year() == 2024));
        assert!(set.records.iter().all(|r| r.date.unwrap().day() == 1));
    }

    #[test]
    fn test_amounts_within_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let set = generate(&mut rng, 24, 2023);
        for r in &set.records {
            assert!((2000.0..8000.0).contains(&r.income), "income {}", r.income);
            assert!((1000.0..6000.0).contains(&r.expense), "expense {}", r.expense);
            assert_eq!(r.income, r.income.trunc());
            assert!(DEPARTMENTS.contains(&r.department.as_deref().unwrap()));
            assert!(REGIONS.contains(&r.region.as_deref().unwrap()));
        }
    }

    #[test]
    fn test_months_roll_into_next_year() {
        let mut rng = StdRng::seed_from_u64(1);
        let set = generate(&mut rng, 14, 2024);
        let last = set.records.last().unwrap().date.unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn test_same_seed_same_output() {
        let a = generate(&mut StdRng::seed_from_u64(99), 6, 2025);
        let b = generate(&mut StdRng::seed_from_u64(99), 6, 2025);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_periods_is_empty() {
        let set = generate(&mut StdRng::seed_from_u64(3), 0, 2024);
        assert!(set.is_empty());
        assert!(set.has(Column::Region));
    }
}
