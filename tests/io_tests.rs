use cachearena::io::{read_records_csv, read_records_json};
use cachearena::{build_csv, normalize_records, UpdateMeta};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ── JSON ────────────────────────────────────────────────────────────────────

#[test]
fn test_read_records_json_array_and_map() {
    let array = write_temp(r#"[{"slug": "a", "model": "One"}, null]"#);
    let value = read_records_json(array.path()).unwrap();
    assert_eq!(value, json!([{ "slug": "a", "model": "One" }, null]));

    let map = write_temp(r#"{"k": {"slug": "b", "price": 0}}"#);
    let records = normalize_records(&read_records_json(map.path()).unwrap(), &UpdateMeta::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].slug, "b");
    assert_eq!(records[0].price, "0");
}

#[test]
fn test_read_records_json_rejects_garbage() {
    let file = write_temp("not json");
    assert!(read_records_json(file.path()).is_err());
    assert!(read_records_json("/definitely/not/here.json").is_err());
}

// ── CSV ─────────────────────────────────────────────────────────────────────

#[test]
fn test_exported_csv_reimports_unchanged() {
    let meta = UpdateMeta::new("extract:phone-page", "phone");
    let batch: Value = json!([
        {
            "slug": "samsung_galaxy_s25",
            "brand": "Samsung",
            "model": "Samsung Galaxy S25",
            "sim": "Nano-SIM, eSIM",
            "colors": "Icy \"blue\", Navy",
            "updatedAt": "2025-03-01T12:00:00.000Z",
            "firstSeen": "2025-02-01T12:00:00.000Z"
        },
        {
            "slug": "nokia_3310",
            "brand": "Nokia",
            "model": "Nokia 3310",
            "build": "Plastic\nfront",
            "updatedAt": "2025-03-02T08:30:00.000Z"
        }
    ]);
    let original = normalize_records(&batch, &meta);
    let file = write_temp(&build_csv(&original));

    let raw = read_records_csv(file.path()).unwrap();
    assert_eq!(raw.len(), 2);
    assert!(!raw[1].contains_key("price"));

    let reimported = normalize_records(
        &Value::Array(raw.into_iter().map(Value::Object).collect()),
        &meta,
    );
    assert_eq!(reimported, original);
}

#[test]
fn test_read_records_csv_skips_blank_rows() {
    let file = write_temp("slug,model\na,One\n,\nb,Two\n");
    let raw = read_records_csv(file.path()).unwrap();
    let slugs: Vec<&str> = raw
        .iter()
        .map(|r| r.get("slug").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(slugs, vec!["a", "b"]);
}
