//! Request parameter normalization.
//!
//! Turns raw query parameters into a typed [`FilterSpec`]. Normalization is
//! fail-open: unparseable values are dropped and out-of-range values are
//! clamped, so a request never fails here.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::ids::CategoryId;
use crate::search::results::page_offset;

/// Raw query parameters of a storefront read.
pub type QueryParams = HashMap<String, String>;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a request may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Sort keys accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Text relevance when there is a query, newest first otherwise.
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
    Popular,
    Name,
}

impl SortKey {
    /// Parse a sort key. Unknown keys fall back to relevance.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "price_low" => Self::PriceLow,
            "price_high" => Self::PriceHigh,
            "rating" => Self::Rating,
            "newest" => Self::Newest,
            "popular" => Self::Popular,
            "name" => Self::Name,
            _ => Self::Relevance,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceLow => "price_low",
            Self::PriceHigh => "price_high",
            Self::Rating => "rating",
            Self::Newest => "newest",
            Self::Popular => "popular",
            Self::Name => "name",
        }
    }
}

/// A category filter as given by the caller: an id or a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    ById(CategoryId),
    ByName(String),
}

impl CategoryRef {
    /// Id-shaped tokens become ids, anything else is treated as a name.
    pub fn parse(token: &str) -> Self {
        match CategoryId::parse(token) {
            Some(id) => CategoryRef::ById(id),
            None => CategoryRef::ByName(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryRef::ById(id) => id.as_str(),
            CategoryRef::ByName(name) => name,
        }
    }
}

impl Serialize for CategoryRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalized search filters for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Current page (1-indexed).
    pub page: u64,
    /// Items per page, in `1..=100`.
    pub limit: u64,
    pub sort: SortKey,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(rename = "rating", skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(rename = "discount", skip_serializing_if = "Option::is_none")]
    pub min_discount: Option<f64>,
    /// Only products with stock on hand.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub in_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bestseller: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on_sale: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort: SortKey::Relevance,
            query: None,
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            min_discount: None,
            in_stock: false,
            is_new: None,
            is_featured: None,
            is_bestseller: None,
            is_on_sale: None,
            colors: Vec::new(),
            sizes: Vec::new(),
        }
    }
}

impl FilterSpec {
    /// Normalize raw query parameters.
    pub fn from_params(params: &QueryParams) -> Self {
        let get = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        Self {
            page: get("page")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|p| p.max(1) as u64)
                .unwrap_or(1),
            limit: get("limit")
                .and_then(|v| v.parse::<i64>().ok())
                .map(|l| l.clamp(1, MAX_LIMIT as i64) as u64)
                .unwrap_or(DEFAULT_LIMIT),
            sort: get("sort").map(SortKey::parse).unwrap_or_default(),
            query: get("q").map(str::to_string),
            category: get("category").map(CategoryRef::parse),
            brand: get("brand").map(str::to_string),
            min_price: get("minPrice").and_then(parse_number),
            max_price: get("maxPrice").and_then(parse_number),
            min_rating: get("rating").and_then(parse_number),
            min_discount: get("discount").and_then(parse_number),
            in_stock: get("inStock") == Some("true"),
            is_new: get("isNew").and_then(parse_flag),
            is_featured: get("isFeatured").and_then(parse_flag),
            is_bestseller: get("isBestseller").and_then(parse_flag),
            is_on_sale: get("isOnSale").and_then(parse_flag),
            colors: get("colors").map(split_list).unwrap_or_default(),
            sizes: get("sizes").map(split_list).unwrap_or_default(),
        }
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }

    /// The free-text query, if the request has one.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }
}

/// Parse an optional `limit` parameter, clamped to `1..=max`.
pub fn parse_limit(params: &QueryParams, default: usize, max: usize) -> usize {
    params
        .get("limit")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|l| l.clamp(1, max.max(1) as i64) as usize)
        .unwrap_or(default)
        .clamp(1, max.max(1))
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let spec = FilterSpec::from_params(&QueryParams::new());
        assert_eq!(spec, FilterSpec::default());
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, 20);
        assert_eq!(spec.offset(), 0);
    }

    #[test]
    fn test_page_and_limit_are_clamped() {
        let spec = FilterSpec::from_params(&params(&[("page", "0"), ("limit", "500")]));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, 100);

        let spec = FilterSpec::from_params(&params(&[("page", "-3"), ("limit", "0")]));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, 1);

        let spec = FilterSpec::from_params(&params(&[("page", "3"), ("limit", "10")]));
        assert_eq!(spec.offset(), 20);
    }

    #[test]
    fn test_invalid_numbers_are_dropped() {
        let spec = FilterSpec::from_params(&params(&[
            ("page", "two"),
            ("minPrice", "cheap"),
            ("maxPrice", "250.5"),
            ("rating", "NaN"),
            ("discount", "20"),
        ]));
        assert_eq!(spec.page, 1);
        assert_eq!(spec.min_price, None);
        assert_eq!(spec.max_price, Some(250.5));
        assert_eq!(spec.min_rating, None);
        assert_eq!(spec.min_discount, Some(20.0));
    }

    #[test]
    fn test_flags_only_accept_literals() {
        let spec = FilterSpec::from_params(&params(&[
            ("inStock", "yes"),
            ("isNew", "true"),
            ("isFeatured", "false"),
            ("isBestseller", "TRUE"),
        ]));
        assert!(!spec.in_stock);
        assert_eq!(spec.is_new, Some(true));
        assert_eq!(spec.is_featured, Some(false));
        assert_eq!(spec.is_bestseller, None);
        assert_eq!(spec.is_on_sale, None);
    }

    #[test]
    fn test_lists_are_split_and_trimmed() {
        let spec = FilterSpec::from_params(&params(&[("colors", " Red, blue ,,"), ("sizes", "M")]));
        assert_eq!(spec.colors, vec!["Red", "blue"]);
        assert_eq!(spec.sizes, vec!["M"]);
    }

    #[test]
    fn test_category_ref_shape() {
        let spec = FilterSpec::from_params(&params(&[("category", "64b7f0c2a1e4d3b2c1a0f9e8")]));
        assert!(matches!(spec.category, Some(CategoryRef::ById(_))));

        let spec = FilterSpec::from_params(&params(&[("category", "Men")]));
        assert_eq!(spec.category, Some(CategoryRef::ByName("Men".into())));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let spec = FilterSpec::from_params(&params(&[("q", "  "), ("brand", ""), ("sort", "bogus")]));
        assert_eq!(spec.query, None);
        assert_eq!(spec.brand, None);
        assert_eq!(spec.sort, SortKey::Relevance);
    }

    #[test]
    fn test_sort_keys() {
        for key in ["price_low", "price_high", "rating", "newest", "popular", "name", "relevance"] {
            assert_eq!(SortKey::parse(key).as_str(), key);
        }
    }

    #[test]
    fn test_applied_filters_serialization() {
        let spec = FilterSpec::from_params(&params(&[("q", "shirt"), ("category", "Men"), ("inStock", "true")]));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["q"], "shirt");
        assert_eq!(json["category"], "Men");
        assert_eq!(json["inStock"], true);
        assert_eq!(json["sort"], "relevance");
        assert!(json.get("brand").is_none());
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(&QueryParams::new(), 10, 50), 10);
        assert_eq!(parse_limit(&params(&[("limit", "80")]), 10, 50), 50);
        assert_eq!(parse_limit(&params(&[("limit", "-1")]), 10, 50), 1);
        assert_eq!(parse_limit(&params(&[("limit", "x")]), 10, 50), 10);
    }
}
