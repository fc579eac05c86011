//! # Order Desk
//!
//! Validation and cleaning service for raw customer orders.
//!
//! ## Features
//!
//! - **Strict Order Model**: untrusted JSON is coerced into a canonical
//!   [`Order`](core::Order) or rejected with every field error at once
//! - **Batch Summaries**: revenue and priority counts over clean batches
//! - **HTTP API**: axum routes for cleaning, batch processing, product
//!   lookup and stored order retrieval
//! - **Natural-Language Intake**: optional model-backed extraction, always
//!   re-validated before use
//! - **File Ingestion**: per-record validation report for JSON files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use order_desk::prelude::*;
//! use serde_json::json;
//!
//! let order = Order::validate(&json!({
//!     "order_id": "102",
//!     "customer_name": "Bob",
//!     "email": "bob@example.com",
//!     "price": "15.50",
//!     "is_priority": "true"
//! }))?;
//!
//! assert_eq!(order.order_id, 102);
//! assert!(order.is_priority);
//! ```

pub mod config;
pub mod core;
pub mod extraction;
pub mod ingest;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        BatchSummary, Catalog, Coercion, FieldError, FieldErrorKind, IndexedFailure, LineItem,
        Order, OrderDeskError, OrderReport, Product, StoredOrder, ValidationFailure, summarize,
    };

    // === Services ===
    pub use crate::core::service::{OrderService, ProductService};
    pub use crate::storage::{InMemoryOrderStore, InMemoryProductStore};

    // === Extraction ===
    pub use crate::extraction::{ExtractionError, OrderExtractor, StaticExtractor};

    // === Server ===
    pub use crate::config::AppConfig;
    pub use crate::server::{AppState, ServerBuilder};
    pub use crate::core::validation::{Validate, Validated};

    // === Re-exports ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
