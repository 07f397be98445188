//! Autocomplete suggestion ranking.
//!
//! Three candidate sources (products, brands, categories) are queried
//! concurrently, scored, and merged into one totally ordered list.

use std::cmp::Ordering;

use edge_data::{DependencyTag, FetchError, StoreClient};
use serde::Serialize;
use turbo_db::{
    desc_by, Accumulator, Aggregation, Document, FindOptions, MatchMode, Predicate, SortSpec, Value,
    GROUP_KEY,
};

use crate::catalog::{category_fields, product_fields as f, Category, Product, CATEGORIES, PRODUCTS};
use crate::config::SuggestionConfig;
use crate::ids::{CategoryId, ProductId};
use crate::search::predicate::active_products;

/// Where a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Product,
    Brand,
    Category,
}

/// Source-specific fields of a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SuggestionDetail {
    Product {
        id: ProductId,
        brand: String,
        price: f64,
        rating: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    Brand {
        count: u64,
        #[serde(rename = "avgPrice")]
        avg_price: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    Category {
        id: CategoryId,
        #[serde(rename = "productCount")]
        product_count: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
}

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub relevance_score: u32,
    #[serde(flatten)]
    pub detail: SuggestionDetail,
}

impl SuggestionItem {
    /// Secondary ranking weight: product rating, brand count, or category size.
    pub fn tie_weight(&self) -> f64 {
        match &self.detail {
            SuggestionDetail::Product { rating, .. } => *rating,
            SuggestionDetail::Brand { count, .. } => *count as f64,
            SuggestionDetail::Category { product_count, .. } => *product_count as f64,
        }
    }

    /// Total order used when merging sources.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .relevance_score
            .cmp(&self.relevance_score)
            .then_with(|| other.tie_weight().total_cmp(&self.tie_weight()))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.text.cmp(&other.text))
    }
}

/// Score a product name and brand against a query.
///
/// Additive: name prefix 10, name substring 5, brand prefix 8, brand
/// substring 3. A prefix also counts as a substring.
pub fn score_product(name: &str, brand: &str, query: &str) -> u32 {
    let mut score = 0;
    if MatchMode::StartsWith.matches(name, query) {
        score += 10;
    }
    if MatchMode::Contains.matches(name, query) {
        score += 5;
    }
    if MatchMode::StartsWith.matches(brand, query) {
        score += 8;
    }
    if MatchMode::Contains.matches(brand, query) {
        score += 3;
    }
    score
}

/// Merge candidate lists and keep the best `limit`.
pub fn merge(sources: Vec<Vec<SuggestionItem>>, limit: usize) -> Vec<SuggestionItem> {
    let mut merged: Vec<SuggestionItem> = sources.into_iter().flatten().collect();
    merged.sort_by(SuggestionItem::rank_cmp);
    merged.truncate(limit);
    merged
}

/// Queries and ranks suggestion candidates.
pub struct SuggestionRanker<'a> {
    client: &'a StoreClient,
    config: &'a SuggestionConfig,
}

impl<'a> SuggestionRanker<'a> {
    pub fn new(client: &'a StoreClient, config: &'a SuggestionConfig) -> Self {
        Self { client, config }
    }

    /// Whether a query is long enough to produce suggestions.
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.config.min_query_len
    }

    /// Ranked suggestions for a partial query. Short queries yield nothing.
    pub async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<SuggestionItem>, FetchError> {
        let query = query.trim();
        if !self.accepts(query) {
            return Ok(Vec::new());
        }

        let (products, brands, categories) = futures::join!(
            self.product_candidates(query),
            self.brand_candidates(query),
            self.category_candidates(query)
        );
        Ok(merge(vec![products?, brands?, categories?], limit))
    }

    /// Active products whose name or brand contains the query.
    ///
    /// Every match is scored before truncation, so a strong name match is
    /// never crowded out by better-rated weak matches.
    pub async fn product_candidates(&self, query: &str) -> Result<Vec<SuggestionItem>, FetchError> {
        let predicate = Predicate::and(vec![
            active_products(),
            Predicate::or(vec![
                Predicate::contains(f::NAME, query),
                Predicate::contains(f::BRAND, query),
            ]),
        ]);
        let options = FindOptions::new().sort(SortSpec::desc(f::RATING).then_asc(f::ID));
        let products: Vec<Product> = self
            .client
            .find(DependencyTag::Suggestions, PRODUCTS, &predicate, &options)
            .await?;

        let mut scored: Vec<(u32, Product)> = products
            .into_iter()
            .map(|p| (score_product(&p.name, &p.brand, query), p))
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| b.rating.total_cmp(&a.rating)));

        Ok(scored
            .into_iter()
            .take(self.config.product_limit)
            .map(|(score, product)| SuggestionItem {
                relevance_score: score,
                kind: SuggestionType::Product,
                detail: SuggestionDetail::Product {
                    image: product.primary_image().map(str::to_string),
                    id: product.id,
                    brand: product.brand,
                    price: product.price,
                    rating: product.rating,
                },
                text: product.name,
            })
            .collect())
    }

    /// Brands of matching active products, scored by how many products match.
    pub async fn brand_candidates(&self, query: &str) -> Result<Vec<SuggestionItem>, FetchError> {
        let predicate = Predicate::and(vec![active_products(), Predicate::contains(f::BRAND, query)]);
        let aggregation = Aggregation::group_by(f::BRAND)
            .with("count", Accumulator::Count)
            .with("avgPrice", Accumulator::Avg(f::PRICE.into()))
            .with("image", Accumulator::First(f::IMAGES.into()));
        let mut rows = self
            .client
            .aggregate(DependencyTag::Suggestions, PRODUCTS, &predicate, &aggregation)
            .await?;

        let by_count = desc_by("count");
        rows.sort_by(|a, b| by_count(a, b).then_with(|| brand_of(a).cmp(brand_of(b))));

        Ok(rows
            .iter()
            .filter(|row| !brand_of(row).is_empty())
            .take(self.config.brand_limit)
            .map(|row| {
                let count = count_of(row);
                SuggestionItem {
                    text: brand_of(row).to_string(),
                    kind: SuggestionType::Brand,
                    relevance_score: count.min(u32::MAX as u64) as u32,
                    detail: SuggestionDetail::Brand {
                        count,
                        avg_price: row.get("avgPrice").and_then(Value::as_f64).unwrap_or(0.0).round(),
                        image: row.get("image").and_then(Value::as_str).map(str::to_string),
                    },
                }
            })
            .collect())
    }

    /// Active categories whose name contains the query, largest first.
    pub async fn category_candidates(&self, query: &str) -> Result<Vec<SuggestionItem>, FetchError> {
        let predicate = Predicate::and(vec![
            Predicate::eq(category_fields::IS_ACTIVE, true),
            Predicate::contains(category_fields::NAME, query),
        ]);
        let options = FindOptions::new()
            .sort(SortSpec::desc(category_fields::PRODUCT_COUNT).then_asc(category_fields::NAME))
            .limit(self.config.category_limit as u64);
        let categories: Vec<Category> = self
            .client
            .find(DependencyTag::Suggestions, CATEGORIES, &predicate, &options)
            .await?;

        Ok(categories
            .into_iter()
            .map(|category| SuggestionItem {
                text: category.name,
                kind: SuggestionType::Category,
                relevance_score: 0,
                detail: SuggestionDetail::Category {
                    id: category.id,
                    product_count: category.product_count,
                    image: category.image,
                },
            })
            .collect())
    }
}

fn brand_of(row: &Document) -> &str {
    row.get(GROUP_KEY).and_then(Value::as_str).unwrap_or("")
}

fn count_of(row: &Document) -> u64 {
    row.get("count").and_then(Value::as_u64).unwrap_or(0)
}
