//! Catalog data types

use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

/// Body of `POST /products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddProductRequest {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

impl AddProductRequest {
    /// Wire names of every accepted field
    pub const FIELDS: &'static [&'static str] =
        &["name", "category", "description", "price", "imageUrl"];

    /// Turn the request into a stored product with the given id
    pub fn into_product(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            category: self.category,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
        }
    }
}
