//! SQLite storage backend using sqlx.
//!
//! Provides `SqliteOrderStore` and `SqliteProductStore` backed by a SQLite
//! database via `sqlx::SqlitePool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `sqlite` feature flag:
//! ```toml
//! [dependencies]
//! order-desk = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! # Schema
//!
//! - `orders`: one row per order, keyed by an internal UUID (`CHAR(36)`)
//! - `order_items`: one row per line item, `order_ref` points at `orders.id`
//! - `products`: the storefront catalog, unique on `sku`

use crate::core::catalog::Product;
use crate::core::error::StorageError;
use crate::core::order::Order;
use crate::core::service::{
    OrderItemRow, OrderRow, OrderService, ProductService, StorageResult, StoredOrder,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

const BACKEND: &str = "SQLite";

fn query_error(e: sqlx::Error) -> StorageError {
    StorageError::QueryError {
        backend: BACKEND.to_string(),
        message: e.to_string(),
    }
}

fn parse_uuid(value: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StorageError::IntegrityError {
        message: format!("Invalid id '{}' in database: {}", value, e),
    })
}

// ---------------------------------------------------------------------------
// Connection and schema management
// ---------------------------------------------------------------------------

/// Open a pool, creating the database file if it does not exist yet.
pub async fn connect(database_url: &str) -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::ConnectionError {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        })?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| StorageError::ConnectionError {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        })
}

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &SqlitePool) -> StorageResult<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS orders (
            id CHAR(36) NOT NULL PRIMARY KEY,
            order_id INTEGER NOT NULL,
            customer_name TEXT NOT NULL,
            email TEXT NOT NULL,
            price REAL NOT NULL,
            is_priority BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_orders_order_id ON orders (order_id)",
        "CREATE TABLE IF NOT EXISTS order_items (
            id CHAR(36) NOT NULL PRIMARY KEY,
            order_ref CHAR(36) NOT NULL REFERENCES orders (id),
            position INTEGER NOT NULL,
            item_name TEXT NOT NULL,
            sku TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            product_id INTEGER NULL,
            price REAL NULL,
            image_url TEXT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_order_items_order_ref ON order_items (order_ref)",
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER NOT NULL PRIMARY KEY,
            item_name TEXT NOT NULL,
            sku TEXT NOT NULL UNIQUE,
            price REAL NOT NULL,
            stock INTEGER NOT NULL,
            image_url TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        )",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(query_error)?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteOrderStore
// ---------------------------------------------------------------------------

type OrderTuple = (String, i64, String, String, f64, bool, DateTime<Utc>);
type ItemTuple = (
    String,
    String,
    i64,
    String,
    String,
    i64,
    Option<i64>,
    Option<f64>,
    Option<String>,
);

const SELECT_ORDERS: &str =
    "SELECT id, order_id, customer_name, email, price, is_priority, created_at FROM orders";
const SELECT_ITEMS: &str = "SELECT id, order_ref, position, item_name, sku, quantity, product_id, price, image_url FROM order_items";

fn order_row(tuple: OrderTuple) -> StorageResult<OrderRow> {
    let (id, order_id, customer_name, email, price, is_priority, created_at) = tuple;
    Ok(OrderRow {
        id: parse_uuid(&id)?,
        order_id,
        customer_name,
        email,
        price,
        is_priority,
        created_at,
    })
}

fn item_row(tuple: ItemTuple) -> StorageResult<OrderItemRow> {
    let (id, order_ref, position, item_name, sku, quantity, product_id, price, image_url) = tuple;
    Ok(OrderItemRow {
        id: parse_uuid(&id)?,
        order_ref: parse_uuid(&order_ref)?,
        position,
        item_name,
        sku,
        quantity,
        product_id,
        price,
        image_url,
    })
}

/// Order store backed by SQLite.
///
/// # Example
///
/// ```rust,ignore
/// let pool = order_desk::storage::sqlite::connect("sqlite://orders.db").await?;
/// ensure_schema(&pool).await?;
/// let store = SqliteOrderStore::new(pool);
/// let stored = store.store(order).await?;
/// ```
#[derive(Clone, Debug)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_rows(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        parent: &OrderRow,
        children: &[OrderItemRow],
    ) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, order_id, customer_name, email, price, is_priority, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(parent.id.to_string())
        .bind(parent.order_id)
        .bind(&parent.customer_name)
        .bind(&parent.email)
        .bind(parent.price)
        .bind(parent.is_priority)
        .bind(parent.created_at)
        .execute(&mut **tx)
        .await
        .map_err(query_error)?;

        for child in children {
            sqlx::query(
                "INSERT INTO order_items (id, order_ref, position, item_name, sku, quantity, product_id, price, image_url) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(child.id.to_string())
            .bind(child.order_ref.to_string())
            .bind(child.position)
            .bind(&child.item_name)
            .bind(&child.sku)
            .bind(child.quantity)
            .bind(child.product_id)
            .bind(child.price)
            .bind(&child.image_url)
            .execute(&mut **tx)
            .await
            .map_err(query_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl OrderService for SqliteOrderStore {
    async fn store(&self, order: Order) -> StorageResult<StoredOrder> {
        let mut stored = self.store_all(vec![order]).await?;
        stored.pop().ok_or_else(|| StorageError::IntegrityError {
            message: "Stored order missing from insert result".to_string(),
        })
    }

    async fn store_all(&self, orders: Vec<Order>) -> StorageResult<Vec<StoredOrder>> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;
        let mut stored = Vec::with_capacity(orders.len());

        for order in &orders {
            let (parent, children) = OrderRow::split(order);
            Self::insert_rows(&mut tx, &parent, &children).await?;
            stored.push(parent.assemble(children));
        }

        tx.commit().await.map_err(query_error)?;
        tracing::debug!(count = stored.len(), "orders stored in SQLite");
        Ok(stored)
    }

    async fn get(&self, id: &Uuid) -> StorageResult<Option<StoredOrder>> {
        let parent = sqlx::query_as::<_, OrderTuple>(&format!("{} WHERE id = ?", SELECT_ORDERS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        let Some(parent) = parent else {
            return Ok(None);
        };
        let parent = order_row(parent)?;

        let children = sqlx::query_as::<_, ItemTuple>(&format!(
            "{} WHERE order_ref = ? ORDER BY position",
            SELECT_ITEMS
        ))
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(item_row)
        .collect::<StorageResult<Vec<_>>>()?;

        Ok(Some(parent.assemble(children)))
    }

    async fn list(&self) -> StorageResult<Vec<StoredOrder>> {
        let parents = sqlx::query_as::<_, OrderTuple>(&format!(
            "{} ORDER BY created_at, rowid",
            SELECT_ORDERS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let mut children: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for tuple in sqlx::query_as::<_, ItemTuple>(SELECT_ITEMS)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?
        {
            let child = item_row(tuple)?;
            children.entry(child.order_ref).or_default().push(child);
        }

        parents
            .into_iter()
            .map(|tuple| {
                let parent = order_row(tuple)?;
                let items = children.remove(&parent.id).unwrap_or_default();
                Ok(parent.assemble(items))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SqliteProductStore
// ---------------------------------------------------------------------------

type ProductTuple = (i64, String, String, f64, i64, String, String);

const SELECT_PRODUCTS: &str =
    "SELECT id, item_name, sku, price, stock, image_url, description FROM products";

fn product(tuple: ProductTuple) -> Product {
    let (id, item_name, sku, price, stock, image_url, description) = tuple;
    Product {
        id,
        item_name,
        sku,
        price,
        stock,
        image_url,
        description,
    }
}

/// Product catalog backed by SQLite
#[derive(Clone, Debug)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductService for SqliteProductStore {
    async fn list(&self) -> StorageResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductTuple>(&format!("{} ORDER BY id", SELECT_PRODUCTS))
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(rows.into_iter().map(product).collect())
    }

    async fn get_by_sku(&self, sku: &str) -> StorageResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductTuple>(&format!("{} WHERE sku = ?", SELECT_PRODUCTS))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(row.map(product))
    }

    async fn seed(&self, products: Vec<Product>) -> StorageResult<usize> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
        if existing > 0 {
            return Ok(0);
        }

        let count = products.len();
        for (position, product) in products.into_iter().enumerate() {
            let id = if product.id == 0 {
                position as i64 + 1
            } else {
                product.id
            };
            sqlx::query(
                "INSERT INTO products (id, item_name, sku, price, stock, image_url, description) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&product.item_name)
            .bind(&product.sku)
            .bind(product.price)
            .bind(product.stock)
            .bind(&product.image_url)
            .bind(&product.description)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(count)
    }
}
