//! Catalog products.

use serde::{Deserialize, Serialize};

use crate::{Price, ProductId, ProductSnapshot};

/// A product as listed by `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl Product {
    /// The subset of this product a cart line carries.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            title: self.title.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
        }
    }
}
