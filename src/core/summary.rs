//! Batch summarizer

use crate::core::order::Order;
use serde::{Deserialize, Serialize};

/// Aggregate metrics over a processed batch of canonical orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub message: String,
    pub total_revenue: f64,
    pub priority_orders: usize,
    pub order_count: usize,
}

/// Summarize a batch: revenue is the sum of prices, priority the count of
/// flagged orders. Pure; an empty batch sums to zero.
pub fn summarize(orders: &[Order]) -> BatchSummary {
    let total_revenue = orders.iter().map(|order| order.price).sum();
    let priority_orders = orders.iter().filter(|order| order.is_priority).count();

    BatchSummary {
        message: format!("Successfully processed {} clean orders.", orders.len()),
        total_revenue,
        priority_orders,
        order_count: orders.len(),
    }
}
