//! In-memory implementations of OrderService and ProductService for testing
//! and development

use crate::core::catalog::Product;
use crate::core::error::StorageError;
use crate::core::order::Order;
use crate::core::service::{
    OrderItemRow, OrderRow, OrderService, ProductService, StorageResult, StoredOrder,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

fn poisoned(e: impl std::fmt::Display) -> StorageError {
    StorageError::IntegrityError {
        message: format!("Failed to acquire lock: {}", e),
    }
}

#[derive(Default)]
struct OrderTables {
    /// Parent rows in insertion order
    orders: IndexMap<Uuid, OrderRow>,
    /// Child rows grouped by `order_ref`
    items: HashMap<Uuid, Vec<OrderItemRow>>,
}

impl OrderTables {
    fn insert(&mut self, parent: OrderRow, children: Vec<OrderItemRow>) {
        self.items.insert(parent.id, children);
        self.orders.insert(parent.id, parent);
    }

    fn assemble(&self, parent: &OrderRow) -> StoredOrder {
        let children = self.items.get(&parent.id).cloned().unwrap_or_default();
        parent.clone().assemble(children)
    }
}

/// In-memory order store
///
/// Uses RwLock for thread-safe access. Parent and child rows live in
/// separate tables like they would in a database.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderStore {
    async fn store(&self, order: Order) -> StorageResult<StoredOrder> {
        let (parent, children) = OrderRow::split(&order);
        let stored = parent.clone().assemble(children.clone());

        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.insert(parent, children);

        tracing::debug!(id = %stored.id, order_id = stored.order.order_id, "order stored");
        Ok(stored)
    }

    async fn store_all(&self, orders: Vec<Order>) -> StorageResult<Vec<StoredOrder>> {
        let rows: Vec<_> = orders.iter().map(OrderRow::split).collect();

        // One lock for the whole batch so readers never see half of it
        let mut tables = self.tables.write().map_err(poisoned)?;
        let stored = rows
            .into_iter()
            .map(|(parent, children)| {
                let stored = parent.clone().assemble(children.clone());
                tables.insert(parent, children);
                stored
            })
            .collect();

        Ok(stored)
    }

    async fn get(&self, id: &Uuid) -> StorageResult<Option<StoredOrder>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.orders.get(id).map(|parent| tables.assemble(parent)))
    }

    async fn list(&self) -> StorageResult<Vec<StoredOrder>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .orders
            .values()
            .map(|parent| tables.assemble(parent))
            .collect())
    }
}

/// In-memory product store, keyed by SKU
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<IndexMap<String, Product>>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductService for InMemoryProductStore {
    async fn list(&self) -> StorageResult<Vec<Product>> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products.values().cloned().collect())
    }

    async fn get_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products.get(sku).cloned())
    }

    async fn seed(&self, seed: Vec<Product>) -> StorageResult<usize> {
        let mut products = self.products.write().map_err(poisoned)?;
        if !products.is_empty() {
            return Ok(0);
        }

        for (position, mut product) in seed.into_iter().enumerate() {
            if product.id == 0 {
                product.id = position as i64 + 1;
            }
            products.insert(product.sku.clone(), product);
        }
        Ok(products.len())
    }
}
