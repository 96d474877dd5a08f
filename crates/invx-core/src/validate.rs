//! Post-extraction sanity check of header fields.

use crate::models::{ExtractionOutput, Table};

/// Fields every invoice summary is expected to carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["invoice_no", "date", "total"];

/// Values vendors use for "not found".
const SENTINELS: [&str; 2] = ["n/a", "not found"];

/// Required fields that are missing or blank in the summary.
///
/// A required name such as `invoice_no` is split on `_` and matches any
/// column where every part starts a word of the lowercase column name
/// (`Invoice Number`, `invoice_numbers`, `Invoice No.`). `Field`/`Value`
/// summaries are read row by row; otherwise only the first row is checked.
pub fn validate_summary(output: &ExtractionOutput, required: &[&str]) -> Vec<String> {
    let fields = summary_fields(output.summary());

    required
        .iter()
        .filter(|name| {
            let parts: Vec<String> = name.split('_').map(str::to_lowercase).collect();
            !fields.iter().any(|(field, value)| {
                let field = field.to_lowercase();
                let words: Vec<&str> = field
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .collect();
                has_value(value) && parts.iter().all(|p| words.iter().any(|w| w.starts_with(p.as_str())))
            })
        })
        .map(|name| name.to_string())
        .collect()
}

fn summary_fields(summary: &Table) -> Vec<(String, String)> {
    if summary.columns() == ["Field", "Value"] {
        return summary
            .rows()
            .iter()
            .map(|row| (row[0].clone(), row[1].clone()))
            .collect();
    }

    match summary.rows().first() {
        Some(row) => summary.columns().iter().cloned().zip(row.iter().cloned()).collect(),
        None => Vec::new(),
    }
}

fn has_value(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !SENTINELS.contains(&value.to_lowercase().as_str())
}
