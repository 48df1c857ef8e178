use chrono::NaiveDate;

/// Insert thousands separators into a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a whole-dollar amount with thousands separators: $1,235
pub fn money(val: f64) -> String {
    let rounded = val.round();
    let negative = rounded < 0.0;
    let whole = format!("{:.0}", rounded.abs());
    let with_commas = group_digits(&whole);
    if negative {
        format!("-${with_commas}")
    } else {
        format!("${with_commas}")
    }
}

/// Format a count with thousands separators: 12,345
pub fn number(n: i64) -> String {
    let grouped = group_digits(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Table date format: 2024/03/01
pub fn table_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Compact axis label: "$12k", "$1.5M"
pub fn format_k(val: f64) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        let m = abs / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}${}M", m as u64)
        } else {
            format!("{sign}${:.1}M", m)
        }
    } else if abs >= 1000.0 {
        let k = abs / 1000.0;
        if k == k.floor() {
            format!("{sign}${}k", k as u64)
        } else {
            format!("{sign}${:.1}k", k)
        }
    } else {
        format!("{sign}${}", abs as u64)
    }
}
