use serde_json::Value;
use std::path::Path;

use crate::error::Result;
use crate::models::RawRecord;

/// Read a batch of raw records from a JSON file (array or map of objects)
pub fn read_records_json<P: AsRef<Path>>(path: P) -> Result<Value> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let value: Value = serde_json::from_str(&content)?;
    log::debug!("Read records from {}", path.as_ref().display());
    Ok(value)
}

/// Read a previously exported CSV back into raw records.
///
/// The header row names the fields; blank cells are left out so they
/// normalize to empty strings.
pub fn read_records_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let mut record = RawRecord::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            if !cell.is_empty() {
                record.insert(name.to_string(), Value::String(cell.to_string()));
            }
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    log::info!(
        "Read {} records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}
