use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ParseError, Result};
use crate::models::{Column, Record, RecordSet};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

/// Month-first wins when a slashed date is ambiguous; day-first only
/// applies when the first field cannot be a month.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a calendar date, dropping any time-of-day component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(any(feature = "excel", test))]
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial as i64))
}

/// Lowercase, strip accents and surrounding whitespace.
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

enum Mapped {
    Known(Column),
    Derived,
    Extra,
}

fn map_header(raw: &str) -> Mapped {
    match normalize_header(raw).as_str() {
        "fecha" | "date" => Mapped::Known(Column::Date),
        "categoria" | "category" => Mapped::Known(Column::Category),
        "departamento" | "department" => Mapped::Known(Column::Department),
        "region" => Mapped::Known(Column::Region),
        "ingresos" | "ingreso" | "income" | "monto" | "amount" => Mapped::Known(Column::Income),
        "egresos" | "egreso" | "expense" | "expenses" => Mapped::Known(Column::Expense),
        "utilidad" | "profit" => Mapped::Derived,
        _ => Mapped::Extra,
    }
}

// ---------------------------------------------------------------------------
// File kinds — enum dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
        }
    }

    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Csv => &["csv"],
            Self::Excel => &["xlsx", "xls"],
        }
    }

    pub fn detect(name: &str) -> std::result::Result<Self, ParseError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        ALL_KINDS
            .iter()
            .find(|k| k.extensions().contains(&ext.as_str()))
            .copied()
            .ok_or_else(|| ParseError::UnsupportedKind(name.to_string()))
    }

    fn read_table(&self, bytes: &[u8]) -> std::result::Result<RawTable, ParseError> {
        match self {
            Self::Csv => read_csv_table(bytes),
            Self::Excel => read_excel_table(bytes),
        }
    }
}

const ALL_KINDS: &[FileKind] = &[FileKind::Csv, FileKind::Excel];

/// Header row plus text cells, before any typing.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    /// Index of the first column whose non-empty cells all parse as dates.
    fn date_column(&self) -> Option<usize> {
        (0..self.headers.len()).find(|&col| {
            let mut seen = false;
            for row in 0..self.rows.len() {
                let cell = self.cell(row, col).trim();
                if cell.is_empty() {
                    continue;
                }
                if parse_date(cell).is_none() {
                    return false;
                }
                seen = true;
            }
            seen
        })
    }

    /// A date-named column with no values at all, as written for undated rows.
    fn blank_date_column(&self) -> Option<usize> {
        self.headers.iter().enumerate().find_map(|(col, header)| {
            let named = matches!(map_header(header), Mapped::Known(Column::Date));
            let blank = (0..self.rows.len()).all(|row| self.cell(row, col).trim().is_empty());
            (named && blank).then_some(col)
        })
    }
}

fn read_csv_table(bytes: &[u8]) -> std::result::Result<RawTable, ParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::Empty);
    }
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

#[cfg(feature = "excel")]
fn read_excel_table(bytes: &[u8]) -> std::result::Result<RawTable, ParseError> {
    use calamine::{Data, Reader};

    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ParseError::Excel(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::Excel("workbook has no sheets".to_string()))?
        .map_err(|e| ParseError::Excel(e.to_string()))?;

    let cell_text = |cell: &Data| -> String {
        match cell {
            Data::Empty | Data::Error(_) => String::new(),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Err(ParseError::Empty),
    };
    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();
    Ok(RawTable { headers, rows })
}

#[cfg(not(feature = "excel"))]
fn read_excel_table(_bytes: &[u8]) -> std::result::Result<RawTable, ParseError> {
    Err(ParseError::Excel(
        "spreadsheet support requires the 'excel' feature".to_string(),
    ))
}

// ---------------------------------------------------------------------------
// ingest
// ---------------------------------------------------------------------------

/// Parse an uploaded file into a record set. Columns are mapped by header
/// name; the first column that parses entirely as dates becomes `date`.
pub fn ingest(bytes: &[u8], kind: FileKind) -> std::result::Result<RecordSet, ParseError> {
    let table = kind.read_table(bytes)?;
    let date_col = table.date_column().or_else(|| table.blank_date_column());

    let mut columns = std::collections::BTreeSet::new();
    let mut known: Vec<(usize, Column)> = Vec::new();
    let mut extra: Vec<(usize, String)> = Vec::new();
    for (i, header) in table.headers.iter().enumerate() {
        if Some(i) == date_col {
            continue;
        }
        match map_header(header) {
            // A header named like a date that did not parse stays raw text.
            Mapped::Known(Column::Date) => extra.push((i, header.clone())),
            Mapped::Known(col) if !columns.contains(&col) => {
                columns.insert(col);
                known.push((i, col));
            }
            Mapped::Derived => {}
            Mapped::Known(_) | Mapped::Extra => extra.push((i, header.clone())),
        }
    }
    if date_col.is_some() {
        columns.insert(Column::Date);
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let mut record = Record {
            date: date_col.and_then(|c| parse_date(table.cell(row, c))),
            category: None,
            department: None,
            region: None,
            income: 0.0,
            expense: 0.0,
            extra: BTreeMap::new(),
        };
        for &(i, col) in &known {
            let cell = table.cell(row, i);
            let text = (!cell.is_empty()).then(|| cell.to_string());
            match col {
                Column::Category => record.category = text,
                Column::Department => record.department = text,
                Column::Region => record.region = text,
                Column::Income => record.income = parse_amount(cell),
                Column::Expense => record.expense = parse_amount(cell),
                Column::Date => {}
            }
        }
        for (i, name) in &extra {
            record.extra.insert(name.clone(), table.cell(row, *i).to_string());
        }
        records.push(record);
    }

    tracing::debug!(
        kind = kind.key(),
        rows = records.len(),
        date_column = ?date_col,
        "ingested upload"
    );

    Ok(RecordSet {
        columns,
        records,
        extra_columns: extra.into_iter().map(|(_, name)| name).collect(),
    })
}

// ---------------------------------------------------------------------------
// Upload adapter
// ---------------------------------------------------------------------------

/// Name and size of an upload, shown to the user unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadInfo {
    pub name: String,
    pub size: u64,
}

pub struct Upload {
    pub info: UploadInfo,
    pub records: RecordSet,
    /// User-visible message when the file could not be parsed.
    pub notice: Option<String>,
}

/// Read and ingest a file. A parse failure falls back to an empty record set
/// with a notice; only IO errors propagate.
pub fn load_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    let info = UploadInfo {
        name: name.clone(),
        size: bytes.len() as u64,
    };

    let parsed = FileKind::detect(&name).and_then(|kind| ingest(&bytes, kind));
    Ok(match parsed {
        Ok(records) => Upload {
            info,
            records,
            notice: None,
        },
        Err(e) => {
            tracing::warn!("could not parse {name}: {e}");
            Upload {
                info,
                records: RecordSet::default(),
                notice: Some(format!("Error reading {name}: {e}")),
            }
        }
    })
}
