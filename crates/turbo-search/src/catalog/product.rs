//! Product records as stored in the catalog.

use crate::ids::{CategoryId, ProductId};
use serde::{Deserialize, Serialize};
use turbo_db::{to_document, DbError, Document};

/// Stored field names on product documents.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const DISCOUNT: &str = "discountPercent";
    pub const CATEGORY: &str = "category";
    pub const CATEGORY_NAME: &str = "categoryName";
    pub const SUBCATEGORY: &str = "subcategory";
    pub const RATING: &str = "rating";
    pub const RATING_COUNT: &str = "ratingCount";
    pub const STOCK: &str = "stock";
    pub const IS_ACTIVE: &str = "isActive";
    pub const IS_FEATURED: &str = "isFeatured";
    pub const IS_NEW: &str = "isNew";
    pub const IS_BESTSELLER: &str = "isBestseller";
    pub const IS_ON_SALE: &str = "isOnSale";
    pub const COLORS: &str = "colors";
    pub const SIZES: &str = "sizes";
    pub const SEARCH_TAGS: &str = "searchTags";
    pub const IMAGES: &str = "images";
    pub const VIEW_COUNT: &str = "viewCount";
    pub const PURCHASE_COUNT: &str = "purchaseCount";
    pub const CREATED_AT: &str = "createdAt";
}

/// A product in the catalog.
///
/// Catalog management owns these records; the search engine only reads them
/// (plus the `viewCount` counter bumped by analytics).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub discount_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    /// Denormalized category name, indexed for text search.
    pub category_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub rating: f64,
    pub rating_count: u64,
    pub stock: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_new: bool,
    pub is_bestseller: bool,
    pub is_on_sale: bool,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub search_tags: Vec<String>,
    pub images: Vec<String>,
    pub view_count: u64,
    pub purchase_count: u64,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl Product {
    /// Create a new active product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Set a sale price; the discount percent is derived from the original price.
    pub fn with_sale(mut self, original_price: f64, price: f64) -> Self {
        self.original_price = Some(original_price);
        self.price = price;
        self.is_on_sale = price < original_price;
        self.discount_percent = if original_price > 0.0 {
            ((original_price - price) / original_price * 100.0).round()
        } else {
            0.0
        };
        self
    }

    pub fn with_category(mut self, id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        self.category = Some(id.into());
        self.category_name = name.into();
        self
    }

    pub fn with_rating(mut self, rating: f64, count: u64) -> Self {
        self.rating = rating;
        self.rating_count = count;
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_colors<S: Into<String>>(mut self, colors: impl IntoIterator<Item = S>) -> Self {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sizes<S: Into<String>>(mut self, sizes: impl IntoIterator<Item = S>) -> Self {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.search_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.images.push(url.into());
        self
    }

    pub fn with_counters(mut self, views: u64, purchases: u64) -> Self {
        self.view_count = views;
        self.purchase_count = purchases;
        self
    }

    pub fn created_at(mut self, timestamp: i64) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }

    pub fn bestseller(mut self) -> Self {
        self.is_bestseller = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check if the product can be bought right now.
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, used as the listing thumbnail.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Convert to a store document.
    pub fn to_document(&self) -> Result<Document, DbError> {
        to_document(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_uses_stored_field_names() {
        let doc = Product::new("p1", "Blue Shirt")
            .with_brand("Acme")
            .with_category("64b7f0c2a1e4d3b2c1a0f9e8", "Men")
            .with_rating(4.5, 12)
            .to_document()
            .unwrap();

        assert_eq!(doc[fields::ID], "p1");
        assert_eq!(doc[fields::BRAND], "Acme");
        assert_eq!(doc[fields::CATEGORY], "64b7f0c2a1e4d3b2c1a0f9e8");
        assert_eq!(doc[fields::CATEGORY_NAME], "Men");
        assert_eq!(doc[fields::RATING_COUNT], 12);
        assert_eq!(doc[fields::IS_ACTIVE], true);
        assert!(doc.contains_key(fields::CREATED_AT));
    }

    #[test]
    fn test_sparse_document_deserializes() {
        let product: Product =
            serde_json::from_value(serde_json::json!({"id": "p9", "name": "Lamp"})).unwrap();
        assert_eq!(product.name, "Lamp");
        assert!(!product.is_active);
        assert!(product.colors.is_empty());
        assert_eq!(product.category, None);
    }

    #[test]
    fn test_sale_pricing() {
        let product = Product::new("p2", "Jacket").with_sale(200.0, 150.0);
        assert!(product.is_on_sale);
        assert_eq!(product.discount_percent, 25.0);
        assert_eq!(product.original_price, Some(200.0));
    }

    #[test]
    fn test_stock_and_image() {
        let product = Product::new("p3", "Cap").with_stock(0).with_image("cap.jpg");
        assert!(!product.is_in_stock());
        assert_eq!(product.primary_image(), Some("cap.jpg"));
    }
}
