use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

/// Well-known columns a record set may carry. Uploaded files can lack any of
/// them, so every stage checks presence before relying on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Category,
    Department,
    Region,
    Income,
    Expense,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Date,
        Column::Category,
        Column::Department,
        Column::Region,
        Column::Income,
        Column::Expense,
    ];

    /// Header used for downloads and the upload template.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Date => "Fecha",
            Self::Category => "Categoria",
            Self::Department => "Departamento",
            Self::Region => "Region",
            Self::Income => "Ingresos",
            Self::Expense => "Egresos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Category => "Category",
            Self::Department => "Department",
            Self::Region => "Region",
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

/// One row of financial activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub region: Option<String>,
    pub income: f64,
    pub expense: f64,
    /// Ingested columns with no well-known meaning, kept as raw text.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn new(date: NaiveDate, category: &str, income: f64, expense: f64) -> Self {
        Self {
            date: Some(date),
            category: Some(category.to_string()),
            department: None,
            region: None,
            income,
            expense,
            extra: BTreeMap::new(),
        }
    }

    pub fn profit(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    pub columns: BTreeSet<Column>,
    pub records: Vec<Record>,
    /// Names of extra columns in their original order.
    pub extra_columns: Vec<String>,
}

impl RecordSet {
    pub fn new(columns: impl IntoIterator<Item = Column>, records: Vec<Record>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            records,
            extra_columns: Vec::new(),
        }
    }

    /// A set with the same schema and no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            records: Vec::new(),
            extra_columns: self.extra_columns.clone(),
        }
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-empty values of a text column, sorted.
    pub fn distinct(&self, column: Column) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|r| match column {
                Column::Category => r.category.as_deref(),
                Column::Department => r.department.as_deref(),
                Column::Region => r.region.as_deref(),
                _ => None,
            })
            .collect();
        values.into_iter().map(str::to_string).collect()
    }
}
