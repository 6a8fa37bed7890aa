//! Record normalization, identity merge and display-key indexing.
//!
//! Two keys are in play here and they serve different purposes:
//! - the identity key `(mediaType, slug)` decides which stored record an
//!   incoming record replaces;
//! - the display key `key_for(brand, model)` only feeds the lossy lookup index.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::config::{CSV_FIELDS, DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE};
use crate::models::{RawRecord, Record, UpdateMeta};
use crate::normalize::key_for;

/// Fields that are neither identity nor provenance
pub fn data_fields() -> impl Iterator<Item = &'static str> {
    CSV_FIELDS
        .iter()
        .copied()
        .filter(|f| !matches!(*f, "mediaType" | "sourceId" | "slug" | "updatedAt" | "firstSeen"))
}

/// Format a timestamp the way records store it (UTC, millisecond precision)
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Coerce a loosely-typed value to the string a record stores.
///
/// Missing, null and empty values become "". Numbers and booleans keep their
/// textual form, so a price of `0` survives as "0".
fn coerce(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The earlier of two timestamps. Unparseable or empty values lose to the
/// other side; when neither can be compared the first argument wins.
fn earliest(first: &str, second: &str) -> String {
    if first.is_empty() {
        return second.to_string();
    }
    if second.is_empty() {
        return first.to_string();
    }
    match (parse_timestamp(first), parse_timestamp(second)) {
        (Some(a), Some(b)) if b < a => second.to_string(),
        (None, Some(_)) => second.to_string(),
        _ => first.to_string(),
    }
}

/// Normalize a raw record using the current time
pub fn normalize_entry(raw: &RawRecord, meta: &UpdateMeta) -> Record {
    normalize_entry_at(raw, meta, Utc::now())
}

/// Normalize a raw record into the canonical shape, stamping with `now` where
/// the input carries no timestamps.
pub fn normalize_entry_at(raw: &RawRecord, meta: &UpdateMeta, now: DateTime<Utc>) -> Record {
    let media_type =
        non_empty(meta.media_type.clone()).unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
    let source_id =
        non_empty(meta.source.clone()).unwrap_or_else(|| DEFAULT_SOURCE.to_string());
    let stamp = timestamp(now);

    let explicit_updated = non_empty(coerce(raw.get("updatedAt")));
    let explicit_first = non_empty(coerce(raw.get("firstSeen")));

    let updated_at = explicit_updated.clone().unwrap_or_else(|| stamp.clone());
    let first_seen = explicit_first.or(explicit_updated).unwrap_or(stamp);
    // firstSeen may never be later than updatedAt
    let first_seen = earliest(&first_seen, &updated_at);

    let slug = non_empty(coerce(raw.get("slug")))
        .or_else(|| non_empty(coerce(raw.get("id"))))
        .unwrap_or_else(|| {
            let model =
                non_empty(coerce(raw.get("model"))).unwrap_or_else(|| "unknown".to_string());
            format!("{}-{}", media_type, model)
        });

    let mut record = Record {
        media_type,
        source_id,
        slug,
        updated_at,
        first_seen,
        ..Record::default()
    };

    for field in data_fields() {
        if let Some(slot) = record.data_field_mut(field) {
            *slot = coerce(raw.get(field));
        }
    }

    record
}

/// JavaScript-style truthiness, used to drop empty slots from a batch
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Flatten an array or map of raw records into a list, skipping falsy slots.
/// Truthy values that are not objects count as records with no fields.
fn to_entry_list(input: &Value) -> Vec<RawRecord> {
    let items: Vec<&Value> = match input {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter(|v| is_truthy(v))
        .map(|v| match v {
            Value::Object(map) => map.clone(),
            _ => RawRecord::new(),
        })
        .collect()
}

/// Normalize a batch given as a JSON array or map of raw records
pub fn normalize_records(input: &Value, meta: &UpdateMeta) -> Vec<Record> {
    let now = Utc::now();
    to_entry_list(input)
        .iter()
        .map(|raw| normalize_entry_at(raw, meta, now))
        .collect()
}

/// Upsert `incoming` into `existing` by identity key.
///
/// A matched record is replaced in full by the incoming one, except
/// `firstSeen` which keeps the earlier value. Unmatched existing records keep
/// their order; new identities follow in incoming order.
pub fn merge_records(existing: Vec<Record>, incoming: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(existing.len() + incoming.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    // A duplicated identity in `existing` keeps its first position, last value
    for record in existing.into_iter().chain(incoming) {
        let key = record.identity_key();
        match positions.get(&key) {
            Some(&pos) => {
                let first_seen = earliest(&merged[pos].first_seen, &record.first_seen);
                merged[pos] = Record {
                    first_seen,
                    ..record
                };
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Build the display-key index. Later entries win on key collisions; records
/// with neither brand nor model are not indexed.
pub fn index_records(entries: &[Record]) -> BTreeMap<String, Record> {
    let mut index = BTreeMap::new();
    for entry in entries {
        let key = key_for(&entry.brand, &entry.model);
        if key.trim() == "|" {
            continue;
        }
        index.insert(key, entry.clone());
    }
    index
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
