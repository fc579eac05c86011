//! Core module containing the order model, validation and service traits

pub mod catalog;
pub mod error;
pub mod order;
pub mod service;
pub mod summary;
pub mod validation;

pub use catalog::{Catalog, Product};
pub use error::{
    FieldError, FieldErrorKind, IndexedFailure, OrderDeskError, Result, ValidationFailure,
};
pub use order::{Coercion, LineItem, Order, OrderReport};
pub use service::{OrderService, ProductService, StoredOrder};
pub use summary::{BatchSummary, summarize};
pub use validation::{Validate, Validated};
