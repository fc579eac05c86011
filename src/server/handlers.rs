//! HTTP handlers for the order desk API

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::host::AppState;
use crate::core::catalog::Product;
use crate::core::error::{IndexedFailure, NotFoundError, OrderDeskError, RequestError, Result};
use crate::core::order::Order;
use crate::core::service::StoredOrder;
use crate::core::summary::{BatchSummary, summarize};
use crate::core::validation::Validated;
use crate::extraction::{ExtractionError, extract_order as run_extraction};

pub const SERVICE_NAME: &str = "order-desk";

/// Response for the single-order cleaning endpoint
#[derive(Debug, Serialize)]
pub struct CleanOrderResponse {
    pub status: &'static str,
    pub message: String,
    pub clean_data: Order,
}

/// Response for the batch endpoint
#[derive(Debug, Serialize)]
pub struct ProcessOrdersResponse {
    #[serde(flatten)]
    pub summary: BatchSummary,
    pub orders: Vec<StoredOrder>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractOrderRequest {
    pub order_text: String,
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| OrderDeskError::from(RequestError::from(rejection)))
}

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
    }))
}

/// List every product in the catalog
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.products.list().await?;
    Ok(Json(products))
}

/// Get one product by SKU
pub async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<Product>> {
    state
        .products
        .get_by_sku(&sku)
        .await?
        .map(Json)
        .ok_or_else(|| NotFoundError::Product { sku }.into())
}

/// List stored orders, oldest first
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<StoredOrder>>> {
    let orders = state.orders.list().await?;
    Ok(Json(orders))
}

/// Get one stored order by its internal id
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredOrder>> {
    let id = Uuid::parse_str(&id).map_err(|_| RequestError::InvalidId { id: id.clone() })?;

    state
        .orders
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| NotFoundError::Order { id }.into())
}

/// Validate one raw record and persist it
pub async fn clean_order(
    State(state): State<AppState>,
    Validated(order): Validated<Order>,
) -> Result<impl IntoResponse> {
    let stored = state.orders.store(order).await?;
    tracing::info!(
        id = %stored.id,
        order_id = stored.order.order_id,
        "order cleaned and stored"
    );

    let message = format!(
        "Order {} for {} is perfectly structured and saved to the database.",
        stored.order.order_id, stored.order.customer_name
    );

    Ok((
        StatusCode::OK,
        Json(CleanOrderResponse {
            status: "success",
            message,
            clean_data: stored.order,
        }),
    ))
}

/// Validate a batch; persist it only if every record is valid
pub async fn process_orders(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessOrdersResponse>> {
    let payload = json_body(payload)?;
    let Value::Array(records) = payload else {
        return Err(RequestError::InvalidBody {
            message: "expected a JSON array of orders".to_string(),
        }
        .into());
    };

    let mut orders = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    for (index, raw) in records.iter().enumerate() {
        match Order::validate(raw) {
            Ok(order) => orders.push(order),
            Err(failure) => failures.push(IndexedFailure {
                index,
                errors: failure.errors,
            }),
        }
    }

    if !failures.is_empty() {
        tracing::info!(
            rejected = failures.len(),
            total = records.len(),
            "batch rejected"
        );
        return Err(OrderDeskError::Batch(failures));
    }

    let summary = summarize(&orders);
    let stored = state.orders.store_all(orders).await?;
    tracing::info!(
        orders = summary.order_count,
        revenue = summary.total_revenue,
        "batch processed"
    );

    Ok(Json(ProcessOrdersResponse {
        summary,
        orders: stored,
    }))
}

/// Turn free text into a canonical order (not persisted)
pub async fn extract_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractOrderRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let request = json_body(payload)?;
    let extractor = state.extractor.as_ref().ok_or(ExtractionError::Unavailable)?;

    let order = run_extraction(extractor.as_ref(), &request.order_text).await?;
    Ok(Json(order))
}
