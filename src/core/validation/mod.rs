//! Validation building blocks
//!
//! Entities validate themselves with an explicit function composed from the
//! coercers in [`coerce`] and the checkers in [`validators`]. Errors are
//! gathered in an [`ErrorCollector`] so a single call reports every problem.

pub mod coerce;
pub mod extractor;
pub mod validators;

pub use extractor::{Validate, Validated};

use crate::core::error::FieldError;

/// Accumulates field errors instead of stopping at the first one
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<FieldError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value on success, record the error otherwise
    pub fn take<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}
