//! Catalog module.
//!
//! Product and category records read by the search engine.

mod category;
mod product;

pub use category::{fields as category_fields, Category};
pub use product::{fields as product_fields, Product};

/// Collection holding product documents.
pub const PRODUCTS: &str = "products";
/// Collection holding category documents.
pub const CATEGORIES: &str = "categories";
/// Collection receiving search analytics events.
pub const SEARCH_ANALYTICS: &str = "searchanalytics";
