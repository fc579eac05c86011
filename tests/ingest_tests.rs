//! File ingestion tests

use order_desk::ingest::{IngestError, ingest_file};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_sample_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/messy_orders.json");
    let report = ingest_file(path).unwrap();

    assert_eq!(report.total(), 7);
    assert_eq!(report.valid.len(), 3);
    assert_eq!(report.invalid.len(), 4);

    let ids: Vec<i64> = report.orders().iter().map(|o| o.order_id).collect();
    assert_eq!(ids, vec![101, 103, 106]);

    let bob = &report.invalid[0];
    assert_eq!(bob.errors.len(), 2);
    assert!(bob.has_error_for("email"));
    assert!(bob.has_error_for("price"));

    let grace = &report.invalid[3];
    assert_eq!(grace.errors[0].field, "items.0.sku");

    let text = report.render();
    assert!(text.contains("SUCCESS 101:"));
    assert!(text.contains("FAILED 102:"));
    assert!(text.contains("      - Field 'customer_name': field required"));
    assert!(text.ends_with("Validation Complete: 3 valid, 4 invalid.\n"));
}

#[test]
fn test_coercions_are_reported() {
    let file = write_temp(
        r#"[{"order_id": "101", "customer_name": "Alice", "email": "alice@example.com", "price": 49.99}]"#,
    );

    let report = ingest_file(file.path()).unwrap();
    let accepted = &report.valid[0];
    assert_eq!(accepted.order().order_id, 101);
    assert!(!accepted.order().is_priority);

    let fields: Vec<&str> = accepted
        .report
        .coercions
        .iter()
        .map(|c| c.field.as_str())
        .collect();
    assert!(fields.contains(&"order_id"));
    assert!(fields.contains(&"is_priority"));
    assert!(!fields.contains(&"price"));
}

#[test]
fn test_missing_file() {
    let err = ingest_file("/no/such/orders.json").unwrap_err();
    assert!(matches!(err, IngestError::Read { .. }));
}

#[test]
fn test_invalid_json() {
    let file = write_temp("[{\"order_id\": 1,");
    let err = ingest_file(file.path()).unwrap_err();
    assert!(matches!(err, IngestError::Json(_)));
}

#[test]
fn test_document_must_be_array() {
    let file = write_temp(r#"{"orders": []}"#);
    let err = ingest_file(file.path()).unwrap_err();
    assert!(matches!(err, IngestError::NotAnArray { found: "an object" }));
    assert!(err.to_string().contains("JSON array"));
}
