//! In-memory product store

use crate::models::Product;
use catalog_core::{Error, Result, ResultExt};
use std::sync::RwLock;

const SEED: &str = include_str!("../data/products.json");

/// Thread-safe list of products
///
/// Readers get a cloned snapshot, so a search never observes a half-applied
/// insert.
#[derive(Debug, Default)]
pub struct ProductRepository {
    products: RwLock<Vec<Product>>,
}

impl ProductRepository {
    /// Repository holding `products`
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Repository holding the bundled sample catalog
    pub fn seeded() -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(SEED)
            .map_err(Error::from)
            .context("Failed to load bundled product data")?;
        Ok(Self::new(products))
    }

    /// Store a new product; its id must be unused
    pub fn add_product(&self, product: Product) -> Result<Product> {
        let mut products = self.products.write().unwrap_or_else(|e| e.into_inner());
        if products.iter().any(|p| p.id == product.id) {
            return Err(Error::conflict(format!(
                "A product with id {} already exists",
                product.id
            )));
        }
        products.push(product.clone());
        Ok(product)
    }

    /// Snapshot of every product in insertion order
    pub fn products(&self) -> Vec<Product> {
        self.products
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn product_by_id(&self, id: &str) -> Option<Product> {
        self.products
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.products.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
