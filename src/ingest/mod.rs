//! Batch file ingestion
//!
//! Reads a JSON array of raw order records and validates each one on its
//! own. A bad record is reported and the rest still go through.

use crate::core::error::ValidationFailure;
use crate::core::order::{Order, OrderReport};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEPARATOR_WIDTH: usize = 40;

/// Errors that stop a file from being ingested at all
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of orders, found {found}")]
    NotAnArray { found: &'static str },
}

/// A record that passed validation
#[derive(Debug, Clone)]
pub struct Accepted {
    pub input: Value,
    pub report: OrderReport,
}

impl Accepted {
    pub fn order(&self) -> &Order {
        &self.report.order
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Valid(usize),
    Invalid(usize),
}

/// Result of validating every record of a file
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub valid: Vec<Accepted>,
    pub invalid: Vec<ValidationFailure>,
    /// Input order of the records, pointing into `valid` or `invalid`
    outcomes: Vec<Outcome>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Canonical orders of all accepted records
    pub fn orders(&self) -> Vec<Order> {
        self.valid.iter().map(|a| a.order().clone()).collect()
    }

    /// Human-readable report, see the `Display` impl
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// One block per record in input order, then the totals
impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match *outcome {
                Outcome::Valid(i) => write_accepted(f, &self.valid[i])?,
                Outcome::Invalid(i) => write_rejected(f, &self.invalid[i])?,
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        writeln!(
            f,
            "Validation Complete: {} valid, {} invalid.",
            self.valid.len(),
            self.invalid.len()
        )
    }
}

fn write_accepted(f: &mut fmt::Formatter<'_>, accepted: &Accepted) -> fmt::Result {
    let clean = serde_json::to_string(accepted.order()).map_err(|_| fmt::Error)?;
    writeln!(f, "SUCCESS {}:", record_label(&accepted.input))?;
    writeln!(f, "   Input: {}", accepted.input)?;
    writeln!(f, "   Clean: {}", clean)?;
    for coercion in &accepted.report.coercions {
        match &coercion.input {
            Some(input) => writeln!(
                f,
                "      ~ {}: {} -> {}",
                coercion.field, input, coercion.output
            )?,
            None => writeln!(f, "      ~ {}: <absent> -> {}", coercion.field, coercion.output)?,
        }
    }
    Ok(())
}

fn write_rejected(f: &mut fmt::Formatter<'_>, failure: &ValidationFailure) -> fmt::Result {
    writeln!(f, "FAILED {}:", record_label(&failure.input))?;
    writeln!(f, "   Input: {}", failure.input)?;
    writeln!(f, "   Errors:")?;
    for error in &failure.errors {
        writeln!(f, "      - Field '{}': {}", error.field, error.message)?;
    }
    Ok(())
}

fn record_label(input: &Value) -> String {
    match input.get("order_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "<no order_id>".to_string(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validate every record of an already-parsed JSON array
pub fn ingest_value(records: &Value) -> Result<IngestReport, IngestError> {
    let records = records.as_array().ok_or(IngestError::NotAnArray {
        found: json_kind(records),
    })?;

    let mut report = IngestReport::default();
    for (index, raw) in records.iter().enumerate() {
        match Order::validate_with_report(raw) {
            Ok(order_report) => {
                report.outcomes.push(Outcome::Valid(report.valid.len()));
                report.valid.push(Accepted {
                    input: raw.clone(),
                    report: order_report,
                });
            }
            Err(failure) => {
                tracing::debug!(index, errors = failure.errors.len(), "record rejected");
                report.outcomes.push(Outcome::Invalid(report.invalid.len()));
                report.invalid.push(failure);
            }
        }
    }

    tracing::info!(
        valid = report.valid.len(),
        invalid = report.invalid.len(),
        "ingestion finished"
    );
    Ok(report)
}

/// Read a JSON file of raw orders and validate each record
pub fn ingest_file(path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading orders");

    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Value = serde_json::from_str(&content)?;
    ingest_value(&records)
}
