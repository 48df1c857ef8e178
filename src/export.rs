use chrono::NaiveDateTime;

use crate::error::{Result, TableroError};
use crate::models::{Column, RecordSet};

/// Example upload layout offered for download.
pub const TEMPLATE_CSV: &str = "Fecha,Categoria,Ingresos,Egresos
2024-01-01,Ventas,5000,3000
2024-02-01,Servicios,7000,4000
";

pub const TEMPLATE_FILENAME: &str = "plantilla_datos.csv";

/// `datos_filtrados_<YYYYMMDD_HHMM>.csv`
pub fn filtered_filename(now: NaiveDateTime) -> String {
    format!("datos_filtrados_{}.csv", now.format("%Y%m%d_%H%M"))
}

fn amount(val: f64) -> String {
    if val == val.trunc() {
        format!("{val:.0}")
    } else {
        val.to_string()
    }
}

/// Serialize a record set as delimited text: known columns first (only those
/// present), then extra columns in their original order.
pub fn to_csv(records: &RecordSet) -> Result<String> {
    let known: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|c| records.has(*c))
        .collect();

    let mut wtr = csv::Writer::from_writer(Vec::new());
    let header: Vec<&str> = known
        .iter()
        .map(|c| c.header())
        .chain(records.extra_columns.iter().map(String::as_str))
        .collect();
    wtr.write_record(&header)?;

    for r in &records.records {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        for c in &known {
            row.push(match c {
                Column::Date => r.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                Column::Category => r.category.clone().unwrap_or_default(),
                Column::Department => r.department.clone().unwrap_or_default(),
                Column::Region => r.region.clone().unwrap_or_default(),
                Column::Income => amount(r.income),
                Column::Expense => amount(r.expense),
            });
        }
        for name in &records.extra_columns {
            row.push(r.extra.get(name).cloned().unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| TableroError::Other(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| TableroError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::importer::{ingest, FileKind};
    use crate::models::Record;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_filtered_filename() {
        let now = NaiveDate::from_ymd_opt(2024, 7, 3)
            .unwrap()
            .and_hms_opt(9, 5, 59)
            .unwrap();
        assert_eq!(filtered_filename(now), "datos_filtrados_20240703_0905.csv");
    }

    #[test]
    fn test_template_literal() {
        let mut lines = TEMPLATE_CSV.lines();
        assert_eq!(lines.next(), Some("Fecha,Categoria,Ingresos,Egresos"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_template_ingests() {
        let set = ingest(TEMPLATE_CSV.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].income, 5000.0);
        assert_eq!(set.records[1].expense, 4000.0);
    }

    #[test]
    fn test_header_row_and_rows() {
        let set = RecordSet::new(
            [Column::Date, Column::Category, Column::Income, Column::Expense],
            vec![Record::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Sales", 1500.5, 200.0)],
        );
        let csv = to_csv(&set).unwrap();
        assert_eq!(csv, "Fecha,Categoria,Ingresos,Egresos\n2024-01-01,Sales,1500.5,200\n");
    }

    #[test]
    fn test_round_trip_generated() {
        let original = generate(&mut StdRng::seed_from_u64(11), 6, 2024);
        let csv = to_csv(&original).unwrap();
        let back = ingest(csv.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(back.columns, original.columns);
        assert_eq!(back.records, original.records);
    }

    #[test]
    fn test_round_trip_undated_rows() {
        let mut record = Record::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Sales", 10.0, 4.0);
        record.date = None;
        let original = RecordSet::new(
            [Column::Date, Column::Category, Column::Income, Column::Expense],
            vec![record],
        );
        let csv = to_csv(&original).unwrap();
        assert_eq!(csv, "Fecha,Categoria,Ingresos,Egresos\n,Sales,10,4\n");
        let back = ingest(csv.as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(back.columns, original.columns);
        assert_eq!(back.records, original.records);
        assert!(back.extra_columns.is_empty());
    }

    #[test]
    fn test_round_trip_keeps_extra_columns() {
        let upload = "Ref,Fecha,Ingresos\nA-1,2024-03-01,10\nA-2,2024-04-01,20\n";
        let original = ingest(upload.as_bytes(), FileKind::Csv).unwrap();
        let back = ingest(to_csv(&original).unwrap().as_bytes(), FileKind::Csv).unwrap();
        assert_eq!(back.records, original.records);
        assert_eq!(back.extra_columns, vec!["Ref"]);
    }
}
