//! CSV serialization of cache entries.

use crate::config::CSV_FIELDS;
use crate::models::Record;

/// Quote a cell if it contains a comma, double quote or newline; inner
/// quotes are doubled.
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render entries as CSV: a header row of `CSV_FIELDS`, then one row per
/// entry, joined with `\n` and no trailing newline.
///
/// No entries yields an empty string rather than a lone header, so callers can
/// tell "nothing to export" apart from an empty table.
pub fn build_csv(entries: &[Record]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(CSV_FIELDS.join(","));

    for entry in entries {
        let row: Vec<String> = CSV_FIELDS
            .iter()
            .map(|field| escape_csv(entry.field(field).unwrap_or_default()))
            .collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
#[path = "csv_export_tests.rs"]
mod tests;
