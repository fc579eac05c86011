//! Service traits for order persistence and the product catalog
//!
//! Orders are stored as a parent row plus one child row per line item, tied
//! by an internally generated id distinct from the caller's `order_id`.
//! Retrieval reassembles the canonical order by looking the children up
//! through that id; rows never point back at their parent in memory.

use crate::core::catalog::Product;
use crate::core::error::StorageError;
use crate::core::order::{LineItem, Order};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A canonical order as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    /// Internal id, independent of `order.order_id`
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub order: Order,
}

/// Parent row of a stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_id: i64,
    pub customer_name: String,
    pub email: String,
    pub price: f64,
    pub is_priority: bool,
    pub created_at: DateTime<Utc>,
}

/// Child row of a stored order, keyed to its parent by `order_ref`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_ref: Uuid,
    /// Position of the item within its order
    pub position: i64,
    pub item_name: String,
    pub sku: String,
    pub quantity: i64,
    pub product_id: Option<i64>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

impl OrderRow {
    /// Split a canonical order into its parent and child rows
    pub fn split(order: &Order) -> (OrderRow, Vec<OrderItemRow>) {
        let parent = OrderRow {
            id: Uuid::new_v4(),
            order_id: order.order_id,
            customer_name: order.customer_name.clone(),
            email: order.email.clone(),
            price: order.price,
            is_priority: order.is_priority,
            created_at: Utc::now(),
        };

        let children = order
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| OrderItemRow {
                id: Uuid::new_v4(),
                order_ref: parent.id,
                position: position as i64,
                item_name: item.item_name.clone(),
                sku: item.sku.clone(),
                quantity: item.quantity,
                product_id: item.product_id,
                price: item.price,
                image_url: item.image_url.clone(),
            })
            .collect();

        (parent, children)
    }

    /// Reassemble the stored order from a parent row and its children
    pub fn assemble(self, mut children: Vec<OrderItemRow>) -> StoredOrder {
        children.sort_by_key(|child| child.position);
        let items = children
            .into_iter()
            .map(|child| LineItem {
                item_name: child.item_name,
                sku: child.sku,
                quantity: child.quantity,
                product_id: child.product_id,
                price: child.price,
                image_url: child.image_url,
            })
            .collect();

        StoredOrder {
            id: self.id,
            created_at: self.created_at,
            order: Order {
                order_id: self.order_id,
                customer_name: self.customer_name,
                email: self.email,
                price: self.price,
                is_priority: self.is_priority,
                items,
            },
        }
    }
}

/// Persistence for canonical orders
///
/// Implementations do not enforce `order_id` uniqueness.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Store an order and its line items
    async fn store(&self, order: Order) -> StorageResult<StoredOrder>;

    /// Store several orders; all or nothing where the backend allows it
    async fn store_all(&self, orders: Vec<Order>) -> StorageResult<Vec<StoredOrder>> {
        let mut stored = Vec::with_capacity(orders.len());
        for order in orders {
            stored.push(self.store(order).await?);
        }
        Ok(stored)
    }

    /// Get a stored order by its internal id
    async fn get(&self, id: &Uuid) -> StorageResult<Option<StoredOrder>>;

    /// List stored orders, oldest first
    async fn list(&self) -> StorageResult<Vec<StoredOrder>>;
}

/// Read access to the product catalog
#[async_trait]
pub trait ProductService: Send + Sync {
    async fn list(&self) -> StorageResult<Vec<Product>>;

    async fn get_by_sku(&self, sku: &str) -> StorageResult<Option<Product>>;

    /// Insert the products if the store is empty; returns how many were added
    async fn seed(&self, products: Vec<Product>) -> StorageResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_items() -> Order {
        Order {
            order_id: 5,
            customer_name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            price: 1299.0,
            is_priority: true,
            items: vec![
                LineItem {
                    item_name: "Customer Support Auto-Responder".to_string(),
                    sku: "CS-001".to_string(),
                    quantity: 1,
                    product_id: Some(1),
                    price: Some(499.0),
                    image_url: None,
                },
                LineItem {
                    item_name: "Automated Data Entry Assistant".to_string(),
                    sku: "DE-001".to_string(),
                    quantity: 2,
                    product_id: None,
                    price: None,
                    image_url: None,
                },
            ],
        }
    }

    #[test]
    fn test_split_links_children_to_parent() {
        let order = order_with_items();
        let (parent, children) = OrderRow::split(&order);
        assert_eq!(parent.order_id, 5);
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.order_ref == parent.id));
        assert_ne!(children[0].id, children[1].id);
    }

    #[test]
    fn test_assemble_restores_order_and_item_order() {
        let order = order_with_items();
        let (parent, mut children) = OrderRow::split(&order);
        children.reverse();
        let stored = parent.assemble(children);
        assert_eq!(stored.order, order);
    }

    #[test]
    fn test_stored_order_serializes_flat() {
        let (parent, children) = OrderRow::split(&order_with_items());
        let stored = parent.assemble(children);
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["order_id"], 5);
        assert_eq!(json["items"][1]["sku"], "DE-001");
        assert!(json["id"].is_string());
    }
}
