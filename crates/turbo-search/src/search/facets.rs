//! Facet aggregation.
//!
//! Facets describe which filter values are available for the current
//! predicate. Brands are complete; colors and sizes take one representative
//! value per product, which understates variety on multi-variant products.

use edge_data::{DependencyTag, FetchError, StoreClient};
use serde::Serialize;
use turbo_db::{Accumulator, Aggregation, Document, FindOptions, Predicate, SortSpec, Value};

use crate::catalog::{category_fields, product_fields as f, Category, CATEGORIES, PRODUCTS};

/// Upper price bound reported when there is no data.
pub const SENTINEL_MAX_PRICE: f64 = 50_000.0;

/// Price bounds of the matching products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Available filter values for a predicate.
///
/// A result with `total_products == 0` is the "no data" sentinel: its price
/// range is a placeholder, never a real bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetResult {
    pub brands: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub price_range: PriceRange,
    pub avg_rating: f64,
    pub total_products: u64,
    /// Every active category, for navigation. Not scoped to the predicate.
    pub categories: Vec<Category>,
}

impl FacetResult {
    /// The fixed "no data" result.
    pub fn sentinel() -> Self {
        Self {
            brands: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            price_range: PriceRange {
                min: 0.0,
                max: SENTINEL_MAX_PRICE,
            },
            avg_rating: 0.0,
            total_products: 0,
            categories: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.total_products == 0
    }

    fn from_row(row: &Document) -> Self {
        let number = |key: &str| row.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Self {
            brands: sorted_strings(row.get("brands")),
            colors: sorted_strings(row.get("colors")),
            sizes: sorted_strings(row.get("sizes")),
            price_range: PriceRange {
                min: number("minPrice"),
                max: number("maxPrice"),
            },
            avg_rating: (number("avgRating") * 10.0).round() / 10.0,
            total_products: row.get("totalProducts").and_then(Value::as_u64).unwrap_or(0),
            categories: Vec::new(),
        }
    }
}

/// The single-pass aggregation computing every facet.
pub fn facet_aggregation() -> Aggregation {
    Aggregation::new()
        .with("brands", Accumulator::AddToSet(f::BRAND.into()))
        .with("colors", Accumulator::AddFirstToSet(f::COLORS.into()))
        .with("sizes", Accumulator::AddFirstToSet(f::SIZES.into()))
        .with("minPrice", Accumulator::Min(f::PRICE.into()))
        .with("maxPrice", Accumulator::Max(f::PRICE.into()))
        .with("avgRating", Accumulator::Avg(f::RATING.into()))
        .with("totalProducts", Accumulator::Count)
}

/// Computes facets scoped to a predicate.
pub struct FacetAggregator<'a> {
    client: &'a StoreClient,
}

impl<'a> FacetAggregator<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Aggregate facets and load navigation categories concurrently.
    ///
    /// Zero matches yields the sentinel (still carrying the categories).
    pub async fn compute(&self, predicate: &Predicate) -> Result<FacetResult, FetchError> {
        let aggregation = facet_aggregation();
        let rows_future =
            self.client
                .aggregate(DependencyTag::Facets, PRODUCTS, predicate, &aggregation);
        let (rows, categories) = futures::join!(rows_future, self.navigation_categories());

        let mut result = rows?
            .first()
            .map(FacetResult::from_row)
            .unwrap_or_else(FacetResult::sentinel);
        result.categories = categories?;
        Ok(result)
    }

    /// Active categories in navigation order.
    pub async fn navigation_categories(&self) -> Result<Vec<Category>, FetchError> {
        let options = FindOptions::new().sort(
            SortSpec::asc(category_fields::DISPLAY_ORDER).then_asc(category_fields::NAME),
        );
        self.client
            .find(
                DependencyTag::Facets,
                CATEGORIES,
                &Predicate::eq(category_fields::IS_ACTIVE, true),
                &options,
            )
            .await
    }
}

fn sorted_strings(value: Option<&Value>) -> Vec<String> {
    let mut items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    items.sort();
    items.dedup();
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::search::predicate::active_products;
    use std::sync::Arc;
    use turbo_db::{MemoryStore, StoreOp};

    fn store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        let products = [
            Product::new("p1", "Blue Shirt")
                .with_brand("Zeta")
                .with_price(30.0)
                .with_rating(4.0, 3)
                .with_colors(["Blue", "White"])
                .with_sizes(["M", "L"]),
            Product::new("p2", "Red Shirt")
                .with_brand("Acme")
                .with_price(10.0)
                .with_rating(4.5, 9)
                .with_colors(["Red"]),
            Product::new("p3", "Hidden").with_brand("Ghost").with_price(999.0).inactive(),
        ];
        store
            .insert_many(PRODUCTS, products.iter().map(|p| p.to_document().unwrap()))
            .unwrap();
        let categories = [
            Category::new("c2", "Women").with_display_order(2),
            Category::new("c1", "Men").with_display_order(1),
            Category::new("c3", "Archive").inactive(),
        ];
        store
            .insert_many(CATEGORIES, categories.iter().map(|c| c.to_document().unwrap()))
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_facets_over_active_products() {
        let client = StoreClient::new(store());
        let facets = FacetAggregator::new(&client)
            .compute(&active_products())
            .await
            .unwrap();

        assert_eq!(facets.brands, vec!["Acme", "Zeta"]);
        assert_eq!(facets.colors, vec!["Blue", "Red"]);
        assert_eq!(facets.sizes, vec!["M"]);
        assert_eq!(facets.price_range, PriceRange { min: 10.0, max: 30.0 });
        assert_eq!(facets.avg_rating, 4.3);
        assert_eq!(facets.total_products, 2);
        let names: Vec<&str> = facets.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Men", "Women"]);
    }

    #[tokio::test]
    async fn test_zero_matches_is_sentinel() {
        let client = StoreClient::new(store());
        let predicate = Predicate::and(vec![active_products(), Predicate::eq("brand", "Nobody")]);
        let facets = FacetAggregator::new(&client).compute(&predicate).await.unwrap();

        assert!(facets.is_sentinel());
        assert_eq!(facets.price_range, PriceRange { min: 0.0, max: SENTINEL_MAX_PRICE });
        assert!(facets.brands.is_empty());
        assert_eq!(facets.categories.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregation_failure_is_reported() {
        let store = store();
        store.fail_operation(StoreOp::Aggregate);
        let client = StoreClient::new(store);
        let err = FacetAggregator::new(&client)
            .compute(&active_products())
            .await
            .unwrap_err();
        assert_eq!(err.tag(), DependencyTag::Facets);
    }

    #[test]
    fn test_sentinel_serialization() {
        let json = serde_json::to_value(FacetResult::sentinel()).unwrap();
        assert_eq!(json["priceRange"]["max"], 50000.0);
        assert_eq!(json["totalProducts"], 0);
        assert_eq!(json["avgRating"], 0.0);
    }
}
