//! HTTP round-trips through the order desk router
//!
//! JSON → HTTP request → handler → validation → store → HTTP response → JSON.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use order_desk::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

async fn make_server() -> TestServer {
    make_server_with(None).await
}

async fn make_server_with(extractor: Option<Arc<dyn OrderExtractor>>) -> TestServer {
    let mut builder = ServerBuilder::new()
        .with_order_service(InMemoryOrderStore::new())
        .with_product_service(InMemoryProductStore::new())
        .with_catalog(Catalog::default_catalog().unwrap())
        .with_cors_origins(["http://localhost:3000"]);
    if let Some(extractor) = extractor {
        builder = builder.with_extractor(extractor);
    }

    builder.seed_catalog().await.unwrap();
    TestServer::new(builder.build().unwrap())
}

fn bob() -> Value {
    json!({
        "order_id": "102",
        "customer_name": "Bob",
        "email": "bob@example.com",
        "price": "15.50",
        "is_priority": "true",
        "items": [{"item_name": "Sales Lead Qualification Bot", "sku": "SL-001", "quantity": "2"}]
    })
}

// =============================================================================
// Health & catalog
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = make_server().await;

    let response = server.get("/health").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "order-desk");
}

#[tokio::test]
async fn test_list_products() {
    let server = make_server().await;

    let response = server.get("/products").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let products = body.as_array().unwrap();
    assert!(!products.is_empty());
    assert_eq!(products[0]["sku"], "CS-001");
    assert_eq!(products[0]["id"], 1);
}

#[tokio::test]
async fn test_get_product_by_sku() {
    let server = make_server().await;

    let response = server.get("/products/SL-001").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["item_name"], "Sales Lead Qualification Bot");
    assert_eq!(body["price"], 899.0);
}

#[tokio::test]
async fn test_get_unknown_product_returns_404() {
    let server = make_server().await;

    let response = server.get("/products/NOPE-404").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
    assert_eq!(body["details"]["sku"], "NOPE-404");
}

// =============================================================================
// /clean-order
// =============================================================================

#[tokio::test]
async fn test_clean_order_coerces_and_stores() {
    let server = make_server().await;

    let response = server.post("/clean-order").json(&bob()).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Order 102 for Bob is perfectly structured and saved to the database."
    );
    assert_eq!(body["clean_data"]["order_id"], 102);
    assert_eq!(body["clean_data"]["price"], 15.5);
    assert_eq!(body["clean_data"]["is_priority"], true);
    assert_eq!(body["clean_data"]["items"][0]["quantity"], 2);

    let orders: Value = server.get("/orders").await.json();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["order_id"], 102);
    assert_eq!(orders[0]["items"][0]["sku"], "SL-001");
}

#[tokio::test]
async fn test_clean_order_rejects_with_all_errors() {
    let server = make_server().await;

    let response = server
        .post("/clean-order")
        .json(&json!({
            "order_id": 103,
            "customer_name": "Charlie",
            "email": "charlie_at_example",
            "price": 0
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let errors = body["details"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "email");
    assert_eq!(errors[1]["field"], "price");
    assert_eq!(errors[1]["kind"], "CONSTRAINT_VIOLATION");
    assert_eq!(body["details"]["input"]["order_id"], 103);

    // Nothing stored on failure
    let orders: Value = server.get("/orders").await.json();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_clean_order_rejects_malformed_json() {
    let server = make_server().await;

    let response = server
        .post("/clean-order")
        .bytes(Bytes::from_static(b"{\"order_id\": "))
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_JSON");
}

#[tokio::test]
async fn test_clean_order_requires_json_content_type() {
    let server = make_server().await;

    // A valid order, but labelled as plain text
    let response = server.post("/clean-order").text(bob().to_string()).await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");

    let orders: Value = server.get("/orders").await.json();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_orders_requires_json_content_type() {
    let server = make_server().await;

    let response = server.post("/process-orders").text("[]").await;
    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.json::<Value>()["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_clean_order_reports_nested_item_errors() {
    let server = make_server().await;

    let mut raw = bob();
    raw["items"] = json!([{"item_name": "Bot", "quantity": 1}]);

    let response = server.post("/clean-order").json(&raw).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["details"]["errors"][0]["field"], "items.0.sku");
    assert_eq!(body["details"]["errors"][0]["kind"], "NESTED_ITEM_ERROR");
    assert_eq!(body["details"]["errors"][0]["inner_kind"], "FIELD_MISSING");
}

// =============================================================================
// /orders/{id}
// =============================================================================

#[tokio::test]
async fn test_get_stored_order_by_id() {
    let server = make_server().await;
    server.post("/clean-order").json(&bob()).await;

    let orders: Value = server.get("/orders").await.json();
    let id = orders[0]["id"].as_str().unwrap();

    let response = server.get(&format!("/orders/{}", id)).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["id"], id);
    assert_eq!(body["customer_name"], "Bob");
}

#[tokio::test]
async fn test_get_order_errors() {
    let server = make_server().await;

    let response = server.get("/orders/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_ID");

    let response = server.get(&format!("/orders/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "ORDER_NOT_FOUND");
}

// =============================================================================
// /process-orders
// =============================================================================

#[tokio::test]
async fn test_process_orders_summarizes_batch() {
    let server = make_server().await;

    let batch = json!([
        {"order_id": 1, "customer_name": "A", "email": "a@example.com", "price": 100.0, "is_priority": true},
        {"order_id": 2, "customer_name": "B", "email": "b@example.com", "price": 250.0},
        {"order_id": 3, "customer_name": "C", "email": "c@example.com", "price": "50", "is_priority": "yes"}
    ]);

    let response = server.post("/process-orders").json(&batch).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["message"], "Successfully processed 3 clean orders.");
    assert_eq!(body["total_revenue"], 400.0);
    assert_eq!(body["priority_orders"], 2);
    assert_eq!(body["order_count"], 3);
    assert_eq!(body["orders"].as_array().unwrap().len(), 3);

    let orders: Value = server.get("/orders").await.json();
    assert_eq!(orders.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_process_empty_batch() {
    let server = make_server().await;

    let response = server.post("/process-orders").json(&json!([])).await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["message"], "Successfully processed 0 clean orders.");
    assert_eq!(body["total_revenue"], 0.0);
    assert_eq!(body["priority_orders"], 0);
}

#[tokio::test]
async fn test_process_orders_rejects_whole_batch() {
    let server = make_server().await;

    let batch = json!([
        {"order_id": 1, "customer_name": "A", "email": "a@example.com", "price": 10},
        {"order_id": 2, "customer_name": "B", "email": "b@example.com", "price": -5},
        "garbage"
    ]);

    let response = server.post("/process-orders").json(&batch).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert_eq!(body["code"], "BATCH_VALIDATION_ERROR");
    let failures = body["details"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["index"], 1);
    assert_eq!(failures[0]["errors"][0]["field"], "price");
    assert_eq!(failures[1]["index"], 2);
    assert_eq!(failures[1]["errors"][0]["field"], "__root__");

    let orders: Value = server.get("/orders").await.json();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_process_orders_requires_array() {
    let server = make_server().await;

    let response = server.post("/process-orders").json(&bob()).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_BODY");
}

// =============================================================================
// /extract-order
// =============================================================================

#[tokio::test]
async fn test_extract_order_unavailable_without_extractor() {
    let server = make_server().await;

    let response = server
        .post("/extract-order")
        .json(&json!({"order_text": "two sales bots for dana@example.com"}))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["code"], "EXTRACTION_UNAVAILABLE");
}

#[tokio::test]
async fn test_extract_order_validates_output() {
    let extractor = StaticExtractor::new(json!({
        "order_id": 555,
        "customer_name": "Dana",
        "email": "dana@example.com",
        "price": 1798,
        "items": [{"item_name": "Sales Lead Qualification Bot", "sku": "SL-001", "quantity": 2}]
    }));
    let server = make_server_with(Some(Arc::new(extractor))).await;

    let response = server
        .post("/extract-order")
        .json(&json!({"order_text": "two sales bots for dana@example.com"}))
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["order_id"], 555);
    assert_eq!(body["price"], 1798.0);
    assert_eq!(body["is_priority"], false);

    // Extraction does not persist
    let orders: Value = server.get("/orders").await.json();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_extract_order_rejects_invalid_output() {
    let extractor = StaticExtractor::new(json!({"order_id": "abc", "price": 10}));
    let server = make_server_with(Some(Arc::new(extractor))).await;

    let response = server
        .post("/extract-order")
        .json(&json!({"order_text": "something"}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    let errors = body["details"]["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "order_id"));
    assert!(errors.iter().any(|e| e["field"] == "email"));
}

#[tokio::test]
async fn test_extract_order_requires_order_text() {
    let server = make_server_with(Some(Arc::new(StaticExtractor::new(json!({}))))).await;

    let response = server
        .post("/extract-order")
        .json(&json!({"text": "missing field name"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INVALID_BODY");
}
