//! Field coercion table
//!
//! Each coercer turns one raw JSON value into the declared type of a field or
//! reports a `TypeMismatch`. Numeric-looking text is accepted for numeric
//! fields; values of a plainly different kind (a boolean where an integer is
//! expected, a number where text is expected) are rejected. Nothing is ever
//! truncated: `49.5` is not an integer.

use crate::core::error::FieldError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static INTEGER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));

// Rejects the "inf" / "nan" spellings `f64::from_str` would otherwise accept.
static FLOAT_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid float pattern")
});

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Coerce to integer: JSON integers, whole floats, integer text
pub fn integer(field: &str, value: &Value) -> Result<i64, FieldError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT {
                    Ok(f as i64)
                } else {
                    Err(FieldError::type_mismatch(
                        field,
                        "Input should be a valid integer, got a number with a fractional part",
                    ))
                }
            } else {
                Err(FieldError::type_mismatch(
                    field,
                    "Input should be a valid integer, number out of range",
                ))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if !INTEGER_TEXT.is_match(trimmed) {
                return Err(FieldError::type_mismatch(
                    field,
                    "Input should be a valid integer, unable to parse string as an integer",
                ));
            }
            trimmed.parse::<i64>().map_err(|_| {
                FieldError::type_mismatch(
                    field,
                    "Input should be a valid integer, number out of range",
                )
            })
        }
        _ => Err(FieldError::type_mismatch(
            field,
            "Input should be a valid integer",
        )),
    }
}

/// Coerce to float: any JSON number, finite numeric text
pub fn float(field: &str, value: &Value) -> Result<f64, FieldError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            FieldError::type_mismatch(field, "Input should be a valid number")
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            if !FLOAT_TEXT.is_match(trimmed) {
                return Err(FieldError::type_mismatch(
                    field,
                    "Input should be a valid number, unable to parse string as a number",
                ));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| {
                    FieldError::type_mismatch(
                        field,
                        "Input should be a finite number",
                    )
                })
        }
        _ => Err(FieldError::type_mismatch(
            field,
            "Input should be a valid number",
        )),
    }
}

/// Coerce to bool: JSON booleans, `0`/`1` (also `0.0`/`1.0`), and the usual
/// yes/no spellings including single letters
pub fn boolean(field: &str, value: &Value) -> Result<bool, FieldError> {
    let mismatch = || FieldError::type_mismatch(field, "Input should be a valid boolean");
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 0.0 => Ok(false),
            Some(x) if x == 1.0 => Ok(true),
            _ => Err(mismatch()),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
            _ => Err(mismatch()),
        },
        _ => Err(mismatch()),
    }
}

/// Accept text as-is; numbers are not turned into text
pub fn text(field: &str, value: &Value) -> Result<String, FieldError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FieldError::type_mismatch(field, "Input should be a valid string"))
}

/// Read a required field: absent or `null` is `FieldMissing`
pub fn required<T>(
    fields: &Map<String, Value>,
    field: &str,
    coerce: impl Fn(&str, &Value) -> Result<T, FieldError>,
) -> Result<T, FieldError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(FieldError::missing(field)),
        Some(value) => coerce(field, value),
    }
}

/// Read an optional field: absent or `null` is `None`
pub fn optional<T>(
    fields: &Map<String, Value>,
    field: &str,
    coerce: impl Fn(&str, &Value) -> Result<T, FieldError>,
) -> Result<Option<T>, FieldError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce(field, value).map(Some),
    }
}
