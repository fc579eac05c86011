//! Typed error handling for order-desk
//!
//! Two layers live here:
//!
//! - The validation reporting model ([`FieldError`], [`FieldErrorKind`],
//!   [`ValidationFailure`]) produced by the order validator. A failure always
//!   carries every violated constraint of a record, never only the first.
//! - The application error hierarchy ([`OrderDeskError`]) used at the HTTP
//!   boundary. Each category maps to an HTTP status code and a stable error
//!   code so clients can match on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use order_desk::prelude::*;
//!
//! match Order::validate(&raw) {
//!     Ok(order) => println!("clean: {:?}", order),
//!     Err(failure) => {
//!         for error in &failure.errors {
//!             println!("{}: {}", error.field, error.message);
//!         }
//!     }
//! }
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Validation reporting model
// =============================================================================

/// Field name used for errors about a record as a whole
pub const ROOT_FIELD: &str = "__root__";

/// Category of a single field-level validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldErrorKind {
    /// A required field is absent from the input
    FieldMissing,
    /// A field is present but cannot be coerced into its declared type
    TypeMismatch,
    /// A field has the right type but violates a constraint
    ConstraintViolation,
    /// A failure inside a line item, attributed with its index
    NestedItemError,
}

impl FieldErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::FieldMissing => "FIELD_MISSING",
            FieldErrorKind::TypeMismatch => "TYPE_MISMATCH",
            FieldErrorKind::ConstraintViolation => "CONSTRAINT_VIOLATION",
            FieldErrorKind::NestedItemError => "NESTED_ITEM_ERROR",
        }
    }
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
    /// Kind of the underlying error when `kind` is `NestedItemError`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_kind: Option<FieldErrorKind>,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::FieldMissing,
            message: "field required".to_string(),
            inner_kind: None,
        }
    }

    pub fn type_mismatch(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::TypeMismatch,
            message: message.into(),
            inner_kind: None,
        }
    }

    pub fn constraint(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::ConstraintViolation,
            message: message.into(),
            inner_kind: None,
        }
    }

    /// Re-attribute a line item error to its parent field and index
    ///
    /// `quantity` inside the third item becomes `items.2.quantity`.
    /// An error about the item itself becomes `items.2`. The original kind
    /// is kept in `inner_kind`.
    pub fn nested(parent: &str, index: usize, inner: FieldError) -> Self {
        let field = if inner.field == ROOT_FIELD {
            format!("{}.{}", parent, index)
        } else {
            format!("{}.{}.{}", parent, index, inner.field)
        };
        Self {
            field,
            kind: FieldErrorKind::NestedItemError,
            message: inner.message,
            inner_kind: Some(inner.inner_kind.unwrap_or(inner.kind)),
        }
    }

    /// The top-level field this error belongs to (`items.0.sku` -> `items`)
    pub fn root_field(&self) -> &str {
        self.field.split('.').next().unwrap_or(&self.field)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Rejection record for one raw input
///
/// Keeps the original input for diagnostics alongside the ordered list of
/// every field error found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub input: Value,
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(input: Value, errors: Vec<FieldError>) -> Self {
        Self { input, errors }
    }

    /// Whether any error is attributed to `field` (or one of its children)
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field == field || e.root_field() == field)
    }

    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field || e.root_field() == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "Validation errors: {}", msgs.join(", "))
    }
}

impl std::error::Error for ValidationFailure {}

/// A rejected record inside a batch, with its position in the batch
#[derive(Debug, Clone, Serialize)]
pub struct IndexedFailure {
    pub index: usize,
    pub errors: Vec<FieldError>,
}

// =============================================================================
// Application errors
// =============================================================================

/// The main error type for order-desk
#[derive(Debug)]
pub enum OrderDeskError {
    /// A single record failed validation
    Validation(ValidationFailure),

    /// One or more records of a batch failed validation
    Batch(Vec<IndexedFailure>),

    /// Lookup of a stored resource failed
    NotFound(NotFoundError),

    /// Storage backend errors
    Storage(StorageError),

    /// LLM extraction errors
    Extraction(crate::extraction::ExtractionError),

    /// Configuration errors
    Config(ConfigError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for OrderDeskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDeskError::Validation(e) => write!(f, "{}", e),
            OrderDeskError::Batch(failures) => {
                write!(f, "{} order(s) in the batch failed validation", failures.len())
            }
            OrderDeskError::NotFound(e) => write!(f, "{}", e),
            OrderDeskError::Storage(e) => write!(f, "{}", e),
            OrderDeskError::Extraction(e) => write!(f, "{}", e),
            OrderDeskError::Config(e) => write!(f, "{}", e),
            OrderDeskError::Request(e) => write!(f, "{}", e),
            OrderDeskError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for OrderDeskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrderDeskError::Validation(e) => Some(e),
            OrderDeskError::NotFound(e) => Some(e),
            OrderDeskError::Storage(e) => Some(e),
            OrderDeskError::Extraction(e) => Some(e),
            OrderDeskError::Config(e) => Some(e),
            OrderDeskError::Request(e) => Some(e),
            OrderDeskError::Batch(_) | OrderDeskError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl OrderDeskError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderDeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderDeskError::Batch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OrderDeskError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderDeskError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrderDeskError::Extraction(e) => e.status_code(),
            OrderDeskError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrderDeskError::Request(e) => e.status_code(),
            OrderDeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            OrderDeskError::Validation(_) => "VALIDATION_ERROR",
            OrderDeskError::Batch(_) => "BATCH_VALIDATION_ERROR",
            OrderDeskError::NotFound(e) => e.error_code(),
            OrderDeskError::Storage(_) => "STORAGE_ERROR",
            OrderDeskError::Extraction(e) => e.error_code(),
            OrderDeskError::Config(_) => "CONFIG_ERROR",
            OrderDeskError::Request(e) => e.error_code(),
            OrderDeskError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            OrderDeskError::Validation(failure) => Some(serde_json::json!({
                "input": failure.input,
                "errors": failure.errors,
            })),
            OrderDeskError::Batch(failures) => {
                Some(serde_json::json!({ "failures": failures }))
            }
            OrderDeskError::NotFound(NotFoundError::Product { sku }) => {
                Some(serde_json::json!({ "sku": sku }))
            }
            OrderDeskError::NotFound(NotFoundError::Order { id }) => {
                Some(serde_json::json!({ "id": id.to_string() }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for OrderDeskError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<ValidationFailure> for OrderDeskError {
    fn from(err: ValidationFailure) -> Self {
        OrderDeskError::Validation(err)
    }
}

impl From<crate::extraction::ExtractionError> for OrderDeskError {
    fn from(err: crate::extraction::ExtractionError) -> Self {
        OrderDeskError::Extraction(err)
    }
}

// =============================================================================
// Not Found Errors
// =============================================================================

/// A requested resource does not exist
#[derive(Debug)]
pub enum NotFoundError {
    Product { sku: String },
    Order { id: Uuid },
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::Product { sku } => write!(f, "Product with sku '{}' not found", sku),
            NotFoundError::Order { id } => write!(f, "Order with id '{}' not found", id),
        }
    }
}

impl std::error::Error for NotFoundError {}

impl NotFoundError {
    pub fn error_code(&self) -> &'static str {
        match self {
            NotFoundError::Product { .. } => "PRODUCT_NOT_FOUND",
            NotFoundError::Order { .. } => "ORDER_NOT_FOUND",
        }
    }
}

impl From<NotFoundError> for OrderDeskError {
    fn from(err: NotFoundError) -> Self {
        OrderDeskError::NotFound(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for OrderDeskError {
    fn from(err: ConfigError) -> Self {
        OrderDeskError::Config(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug)]
pub enum StorageError {
    /// Connection error
    ConnectionError { backend: String, message: String },

    /// Query execution error
    QueryError { backend: String, message: String },

    /// Lock poisoned or data integrity error
    IntegrityError { message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionError { backend, message } => {
                write!(f, "Failed to connect to {}: {}", backend, message)
            }
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
            StorageError::IntegrityError { message } => {
                write!(f, "Data integrity error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for OrderDeskError {
    fn from(err: StorageError) -> Self {
        OrderDeskError::Storage(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Request body is not valid JSON
    InvalidJson { message: String },

    /// Request body has the wrong shape
    InvalidBody { message: String },

    /// Invalid identifier in the path
    InvalidId { id: String },

    /// Body was not sent as `application/json`
    UnsupportedMediaType { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidJson { message } => write!(f, "Invalid JSON: {}", message),
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            RequestError::InvalidId { id } => write!(f, "Invalid id format: {}", id),
            RequestError::UnsupportedMediaType { message } => {
                write!(f, "Unsupported media type: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidJson { .. } => "INVALID_JSON",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidId { .. } => "INVALID_ID",
            RequestError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
        }
    }
}

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(e) => RequestError::UnsupportedMediaType {
                message: e.body_text(),
            },
            // Well-formed JSON with the wrong shape
            JsonRejection::JsonDataError(e) => RequestError::InvalidBody {
                message: e.body_text(),
            },
            other => RequestError::InvalidJson {
                message: other.body_text(),
            },
        }
    }
}

impl From<RequestError> for OrderDeskError {
    fn from(err: RequestError) -> Self {
        OrderDeskError::Request(err)
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrderDeskError>;
