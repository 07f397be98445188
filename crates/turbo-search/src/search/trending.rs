//! Trending categories and popular or featured products.

use edge_data::{DependencyTag, FetchError, StoreClient};
use serde::Serialize;
use turbo_db::{FindOptions, Predicate, SortSpec};

use crate::catalog::{category_fields, product_fields as f, Category, Product, CATEGORIES, PRODUCTS};
use crate::ids::CategoryId;
use crate::search::predicate::active_products;

/// A category ranked by its trend score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub product_count: u64,
    pub active_product_count: u64,
    /// `productCount × displayOrder`. A tunable proxy, not a measured trend.
    pub trend_score: i64,
}

impl From<Category> for TrendingCategory {
    fn from(category: Category) -> Self {
        Self {
            trend_score: category.trend_score(),
            id: category.id,
            name: category.name,
            image: category.image,
            product_count: category.product_count,
            active_product_count: category.active_product_count,
        }
    }
}

/// Rank categories: score desc, then active product count desc, then name.
pub fn rank_categories(categories: Vec<Category>, limit: usize) -> Vec<TrendingCategory> {
    let mut ranked: Vec<TrendingCategory> = categories
        .into_iter()
        .filter(Category::is_trending_eligible)
        .map(TrendingCategory::from)
        .collect();
    ranked.sort_by(|a, b| {
        b.trend_score
            .cmp(&a.trend_score)
            .then_with(|| b.active_product_count.cmp(&a.active_product_count))
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

/// Ordering for popular products: a priority chain, not a blended score.
pub fn popular_order() -> SortSpec {
    SortSpec::desc(f::RATING)
        .then_desc(f::RATING_COUNT)
        .then_desc(f::PURCHASE_COUNT)
        .then_desc(f::VIEW_COUNT)
        .then_asc(f::ID)
}

/// Ordering for featured products.
pub fn featured_order() -> SortSpec {
    SortSpec::desc(f::RATING)
        .then_desc(f::RATING_COUNT)
        .then_desc(f::CREATED_AT)
        .then_asc(f::ID)
}

/// Resolves trending and popularity listings.
pub struct TrendingResolver<'a> {
    client: &'a StoreClient,
}

impl<'a> TrendingResolver<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Active categories with active products, ranked by trend score.
    pub async fn trending_categories(&self, limit: usize) -> Result<Vec<TrendingCategory>, FetchError> {
        let predicate = Predicate::and(vec![
            Predicate::eq(category_fields::IS_ACTIVE, true),
            Predicate::gt(category_fields::ACTIVE_PRODUCT_COUNT, 0),
        ]);
        let categories: Vec<Category> = self
            .client
            .find(DependencyTag::Trending, CATEGORIES, &predicate, &FindOptions::new())
            .await?;
        Ok(rank_categories(categories, limit))
    }

    /// Active products by rating, rating count, purchases, then views.
    pub async fn popular_products(&self, limit: usize) -> Result<Vec<Product>, FetchError> {
        let options = FindOptions::new().sort(popular_order()).limit(limit as u64);
        self.client
            .find(DependencyTag::Trending, PRODUCTS, &active_products(), &options)
            .await
    }

    /// Active featured products, best rated first.
    pub async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, FetchError> {
        let predicate = Predicate::and(vec![active_products(), Predicate::eq(f::IS_FEATURED, true)]);
        let options = FindOptions::new().sort(featured_order()).limit(limit as u64);
        self.client
            .find(DependencyTag::Trending, PRODUCTS, &predicate, &options)
            .await
    }
}
