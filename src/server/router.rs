//! Route table

use super::handlers::{
    clean_order, extract_order, get_order, get_product, health, list_orders, list_products,
    process_orders,
};
use super::host::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the API routes
///
/// - GET  /health
/// - GET  /products, /products/{sku}
/// - GET  /orders, /orders/{id}
/// - POST /clean-order
/// - POST /process-orders
/// - POST /extract-order
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/{sku}", get(get_product))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/clean-order", post(clean_order))
        .route("/process-orders", post(process_orders))
        .route("/process-orders/", post(process_orders))
        .route("/extract-order", post(extract_order))
        .with_state(state)
}
