//! Product catalog
//!
//! The storefront catalog is bundled as YAML and keyed by SKU. It seeds the
//! product store and feeds the pricing rules given to the extraction model.

use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

const DEFAULT_CATALOG: &str = include_str!("../../data/catalog.yaml");

const PROMPT_TEMPLATE: &str = "{% for p in products %}{% if not loop.first %}\n{% endif %}\
- {{ p.item_name }} (SKU: {{ p.sku }}): ${{ p.price }} each{% endfor %}";

/// A product offered in the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Assigned by the store; 0 until stored
    #[serde(default)]
    pub id: i64,
    pub item_name: String,
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Products keyed by SKU, in catalog order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: IndexMap<String, Product>,
}

impl Catalog {
    /// The bundled storefront catalog
    pub fn default_catalog() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_CATALOG)
    }

    /// Load a catalog from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a catalog from YAML; products without an id are numbered from 1
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::from_products(file.products)
    }

    pub fn from_products(products: Vec<Product>) -> Result<Self> {
        let mut catalog = IndexMap::with_capacity(products.len());
        for (position, mut product) in products.into_iter().enumerate() {
            if product.id == 0 {
                product.id = position as i64 + 1;
            }
            if catalog.contains_key(&product.sku) {
                return Err(anyhow!("Duplicate SKU in catalog: {}", product.sku));
            }
            catalog.insert(product.sku.clone(), product);
        }
        Ok(Self { products: catalog })
    }

    pub fn list(&self) -> Vec<Product> {
        self.products.values().cloned().collect()
    }

    pub fn get_by_sku(&self, sku: &str) -> Option<&Product> {
        self.products.get(sku)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// One line per product: `- {name} (SKU: {sku}): ${price} each`
    pub fn prompt(&self) -> Result<String> {
        catalog_prompt(&self.list())
    }
}

/// Render the pricing lines handed to the extraction model
pub fn catalog_prompt(products: &[Product]) -> Result<String> {
    let mut context = Context::new();
    context.insert("products", products);
    Tera::one_off(PROMPT_TEMPLATE, &context, false)
        .map_err(|e| anyhow!("Failed to render catalog prompt: {}", e))
}
