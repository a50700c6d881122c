//! Catalog collaborator: supplier of product and stock data.
//!
//! The cart never fetches anything itself; at add time a handler looks the
//! product up here and hands the resulting candidate (display fields plus
//! `available_stock`) to the aggregate. Staleness between this lookup and the
//! mutation is accepted and resolved downstream at order placement.
//!
//! Catalog internals are out of scope for this service, so the shipped
//! implementation is [`StaticCatalog`], an in-memory table optionally seeded
//! from a JSON file. The [`Catalog`] trait is the seam a real remote catalog
//! client would implement.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use pomelo_core::cart::CandidateItem;
use pomelo_core::{Condition, Price, ProductId, StorageCapacity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the catalog collaborator.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog backend could not be reached.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// The catalog seed file could not be read.
    #[error("catalog seed unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog seed file is not valid JSON.
    #[error("catalog seed malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A product as the catalog describes it at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Opaque product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Classification tag.
    pub category: String,
    /// Price per unit.
    pub unit_price: Price,
    /// Optional pre-discount reference price.
    pub list_price: Option<Price>,
    /// Units currently available.
    pub available_stock: u32,
}

impl CatalogProduct {
    /// Build a cart candidate for this product with the shopper's variant
    /// selection.
    #[must_use]
    pub fn candidate(
        &self,
        storage: Option<StorageCapacity>,
        condition: Option<Condition>,
        color: Option<String>,
    ) -> CandidateItem {
        CandidateItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            list_price: self.list_price,
            category: self.category.clone(),
            available_stock: self.available_stock,
            storage,
            condition,
            color,
        }
    }
}

/// Supplier of product display fields and stock levels.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a product by ID. `Ok(None)` means the product does not exist.
    async fn product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError>;
}

/// In-memory catalog seeded at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: HashMap<ProductId, CatalogProduct>,
}

impl StaticCatalog {
    /// Build a catalog from a product list.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        }
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Malformed` if the JSON does not parse.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let products: Vec<CatalogProduct> = serde_json::from_str(raw)?;
        Ok(Self::new(products))
    }

    /// Load a catalog seed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read and
    /// `CatalogError::Malformed` if it does not parse.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn product(&self, id: &ProductId) -> Result<Option<CatalogProduct>, CatalogError> {
        Ok(self.products.get(id).cloned())
    }
}
