//! Reusable field validators
//!
//! Validators run on already-coerced values and report `ConstraintViolation`s.

use crate::core::error::FieldError;
use validator::ValidateEmail;

/// Validator: number must be strictly greater than 0
pub fn positive() -> impl Fn(&str, f64) -> Result<(), FieldError> + Send + Sync + Clone {
    |field: &str, value: f64| {
        if value > 0.0 {
            Ok(())
        } else {
            Err(FieldError::constraint(
                field,
                format!("must be strictly greater than 0 (value: {})", value),
            ))
        }
    }
}

/// Validator: text must contain something other than whitespace
pub fn non_empty() -> impl Fn(&str, &str) -> Result<(), FieldError> + Send + Sync + Clone {
    |field: &str, value: &str| {
        if value.trim().is_empty() {
            Err(FieldError::constraint(field, "must not be empty"))
        } else {
            Ok(())
        }
    }
}

/// Validator: text must be an email address
///
/// `local@domain`, where the domain contains at least one dot that is not at
/// either end.
pub fn email() -> impl Fn(&str, &str) -> Result<(), FieldError> + Send + Sync + Clone {
    |field: &str, value: &str| {
        let invalid = || FieldError::constraint(field, "not a valid email address");

        let Some((local, domain)) = value.rsplit_once('@') else {
            return Err(invalid());
        };
        let dotted = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
        if local.is_empty() || !dotted || !value.validate_email() {
            return Err(invalid());
        }
        Ok(())
    }
}

/// Run a validator and hand the value back on success
pub fn ensure<T: Copy>(
    field: &str,
    value: T,
    check: impl Fn(&str, T) -> Result<(), FieldError>,
) -> Result<T, FieldError> {
    check(field, value).map(|_| value)
}
