//! Category records for catalog navigation.

use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};
use turbo_db::{to_document, DbError, Document};

/// Stored field names on category documents.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const PRODUCT_COUNT: &str = "productCount";
    pub const ACTIVE_PRODUCT_COUNT: &str = "activeProductCount";
    pub const DISPLAY_ORDER: &str = "displayOrder";
    pub const IS_ACTIVE: &str = "isActive";
}

/// A product category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Number of products in this category.
    pub product_count: u64,
    /// Number of active products in this category.
    pub active_product_count: u64,
    pub subcategories: Vec<String>,
    /// Sort position in navigation; also used as the trending boost weight.
    pub display_order: i64,
    pub is_active: bool,
}

impl Category {
    /// Create a new active category.
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn with_counts(mut self, products: u64, active_products: u64) -> Self {
        self.product_count = products;
        self.active_product_count = active_products;
        self
    }

    pub fn with_display_order(mut self, order: i64) -> Self {
        self.display_order = order;
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Proxy popularity score: product count boosted by display order.
    pub fn trend_score(&self) -> i64 {
        (self.product_count as i64).saturating_mul(self.display_order)
    }

    /// Whether the category can appear in trending lists.
    pub fn is_trending_eligible(&self) -> bool {
        self.is_active && self.active_product_count > 0
    }

    /// Convert to a store document.
    pub fn to_document(&self) -> Result<Document, DbError> {
        to_document(self)
    }
}
