//! Store predicate construction from normalized filters.

use edge_data::{DependencyTag, FetchError, StoreClient};
use turbo_db::{FindOptions, MatchMode, Predicate, SortSpec, TextIndex};

use crate::catalog::{category_fields, product_fields as f, Category, CATEGORIES, PRODUCTS};
use crate::ids::CategoryId;
use crate::search::filter::{CategoryRef, FilterSpec};

/// Weights of the product text index, highest first.
pub const TEXT_INDEX_WEIGHTS: [(&str, u32); 6] = [
    (f::NAME, 10),
    (f::BRAND, 8),
    (f::CATEGORY_NAME, 6),
    (f::SEARCH_TAGS, 5),
    (f::SUBCATEGORY, 3),
    (f::DESCRIPTION, 1),
];

/// The weighted text index the product collection is expected to carry.
pub fn product_text_index() -> TextIndex {
    TEXT_INDEX_WEIGHTS
        .iter()
        .fold(TextIndex::new(), |index, (field, weight)| index.with_field(*field, *weight))
}

/// Fields scanned by the case-insensitive fallback when there is no text index.
pub const FALLBACK_TEXT_FIELDS: [&str; 4] = [f::NAME, f::BRAND, f::DESCRIPTION, f::SEARCH_TAGS];

/// A predicate ready to run, plus how it was built.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPredicate {
    pub predicate: Predicate,
    /// The query is scored by the store's text index.
    pub text_scored: bool,
    /// The category the filter resolved to, if any.
    pub category: Option<CategoryId>,
}

/// Builds store predicates, resolving category names through the store.
pub struct PredicateBuilder<'a> {
    client: &'a StoreClient,
    use_text_index: bool,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self {
            client,
            use_text_index: true,
        }
    }

    /// Allow or forbid delegating text scoring to the store.
    pub fn with_text_index(mut self, enabled: bool) -> Self {
        self.use_text_index = enabled;
        self
    }

    /// Whether free-text queries will be scored by the store.
    pub fn text_index_available(&self) -> bool {
        self.use_text_index && self.client.has_text_index(PRODUCTS)
    }

    /// Build the predicate for a request.
    ///
    /// An unresolved category name drops the category filter.
    pub async fn build(&self, spec: &FilterSpec) -> Result<BuiltPredicate, FetchError> {
        let category = match &spec.category {
            Some(reference) => self.resolve_category(reference).await?,
            None => None,
        };
        let text_scored = spec.has_query() && self.text_index_available();

        Ok(BuiltPredicate {
            predicate: filter_predicate(spec, category.as_ref(), text_scored),
            text_scored,
            category,
        })
    }

    /// Resolve a category reference to an id.
    ///
    /// Names match exactly, ignoring case; the lowest display order wins.
    pub async fn resolve_category(
        &self,
        reference: &CategoryRef,
    ) -> Result<Option<CategoryId>, FetchError> {
        let name = match reference {
            CategoryRef::ById(id) => return Ok(Some(id.clone())),
            CategoryRef::ByName(name) => name,
        };

        let options = FindOptions::new()
            .sort(
                SortSpec::asc(category_fields::DISPLAY_ORDER)
                    .then_asc(category_fields::NAME)
                    .then_asc(category_fields::ID),
            )
            .limit(1);
        let found: Vec<Category> = self
            .client
            .find(
                DependencyTag::Categories,
                CATEGORIES,
                &Predicate::matches(category_fields::NAME, name.as_str(), MatchMode::Exact),
                &options,
            )
            .await?;

        Ok(found.into_iter().next().map(|c| c.id))
    }
}

/// The always-on scope: only active products are searchable.
pub fn active_products() -> Predicate {
    Predicate::eq(f::IS_ACTIVE, true)
}

/// Free-text predicate: a text-index search, or an OR of substring matches.
pub fn text_predicate(query: &str, text_scored: bool) -> Predicate {
    if text_scored {
        Predicate::text(query)
    } else {
        Predicate::or(
            FALLBACK_TEXT_FIELDS
                .iter()
                .map(|field| Predicate::contains(*field, query))
                .collect(),
        )
    }
}

/// Build the predicate for filters whose category is already resolved.
pub fn filter_predicate(
    spec: &FilterSpec,
    category: Option<&CategoryId>,
    text_scored: bool,
) -> Predicate {
    let mut clauses = vec![active_products()];

    if let Some(query) = spec.query() {
        clauses.push(text_predicate(query, text_scored));
    }
    if let Some(id) = category {
        clauses.push(Predicate::eq(f::CATEGORY, id.as_str()));
    }
    if let Some(brand) = &spec.brand {
        clauses.push(Predicate::matches(f::BRAND, brand.as_str(), MatchMode::Exact));
    }
    if let Some(min) = spec.min_price {
        clauses.push(Predicate::gte(f::PRICE, min));
    }
    if let Some(max) = spec.max_price {
        clauses.push(Predicate::lte(f::PRICE, max));
    }
    if let Some(rating) = spec.min_rating {
        clauses.push(Predicate::gte(f::RATING, rating));
    }
    if let Some(discount) = spec.min_discount {
        clauses.push(Predicate::gte(f::DISCOUNT, discount));
    }
    if spec.in_stock {
        clauses.push(Predicate::gt(f::STOCK, 0));
    }

    let flags = [
        (f::IS_NEW, spec.is_new),
        (f::IS_FEATURED, spec.is_featured),
        (f::IS_BESTSELLER, spec.is_bestseller),
        (f::IS_ON_SALE, spec.is_on_sale),
    ];
    for (field, value) in flags {
        if let Some(value) = value {
            clauses.push(Predicate::eq(field, value));
        }
    }

    if !spec.colors.is_empty() {
        clauses.push(any_of(f::COLORS, &spec.colors));
    }
    if !spec.sizes.is_empty() {
        clauses.push(any_of(f::SIZES, &spec.sizes));
    }

    Predicate::and(clauses)
}

fn any_of(field: &str, values: &[String]) -> Predicate {
    Predicate::or(
        values
            .iter()
            .map(|v| Predicate::matches(field, v.as_str(), MatchMode::Exact))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filter::QueryParams;
    use std::sync::Arc;
    use turbo_db::MemoryStore;

    fn spec(pairs: &[(&str, &str)]) -> FilterSpec {
        let params: QueryParams = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FilterSpec::from_params(&params)
    }

    fn client(store: MemoryStore) -> StoreClient {
        StoreClient::new(Arc::new(store))
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let categories = [
            Category::new("64b7f0c2a1e4d3b2c1a0f9e8", "Men").with_display_order(1),
            Category::new("64b7f0c2a1e4d3b2c1a0f9e9", "men").with_display_order(5),
            Category::new("64b7f0c2a1e4d3b2c1a0f9ea", "Women").with_display_order(2),
        ];
        store
            .insert_many(
                CATEGORIES,
                categories.iter().map(|c| c.to_document().unwrap()),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_empty_spec_is_active_only() {
        assert_eq!(filter_predicate(&spec(&[]), None, false), active_products());
    }

    #[test]
    fn test_text_fallback_is_or_over_fields() {
        let p = filter_predicate(&spec(&[("q", "shirt")]), None, false);
        let Predicate::And(clauses) = p else {
            panic!("expected a conjunction");
        };
        match &clauses[1] {
            Predicate::Or(alternatives) => assert_eq!(alternatives.len(), FALLBACK_TEXT_FIELDS.len()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_index_delegation() {
        let p = filter_predicate(&spec(&[("q", "shirt")]), None, true);
        assert_eq!(p.text_query(), Some("shirt"));
    }

    #[test]
    fn test_flags_apply_only_when_present() {
        let p = filter_predicate(&spec(&[("isNew", "false"), ("isOnSale", "maybe")]), None, false);
        assert_eq!(
            p,
            Predicate::and(vec![active_products(), Predicate::eq(f::IS_NEW, false)])
        );
    }

    #[test]
    fn test_ranges_are_inclusive_bounds() {
        let p = filter_predicate(&spec(&[("minPrice", "10"), ("maxPrice", "20")]), None, false);
        assert_eq!(
            p,
            Predicate::and(vec![
                active_products(),
                Predicate::gte(f::PRICE, 10.0),
                Predicate::lte(f::PRICE, 20.0),
            ])
        );
    }

    #[tokio::test]
    async fn test_category_by_name_resolves_lowest_display_order() {
        let client = client(seeded());
        let builder = PredicateBuilder::new(&client);
        let built = builder.build(&spec(&[("category", "MEN")])).await.unwrap();
        assert_eq!(built.category, Some(CategoryId::new("64b7f0c2a1e4d3b2c1a0f9e8")));
    }

    #[tokio::test]
    async fn test_unknown_category_name_is_dropped() {
        let client = client(seeded());
        let builder = PredicateBuilder::new(&client);
        let built = builder.build(&spec(&[("category", "Zzzz")])).await.unwrap();
        assert_eq!(built.category, None);
        assert_eq!(built.predicate, active_products());
    }

    #[tokio::test]
    async fn test_category_id_is_used_directly() {
        let client = client(MemoryStore::new());
        let builder = PredicateBuilder::new(&client);
        let built = builder
            .build(&spec(&[("category", "64b7f0c2a1e4d3b2c1a0f9ff")]))
            .await
            .unwrap();
        assert_eq!(built.category, Some(CategoryId::new("64b7f0c2a1e4d3b2c1a0f9ff")));
    }

    #[tokio::test]
    async fn test_text_index_requires_store_and_config() {
        let store = MemoryStore::new().with_text_index(PRODUCTS, product_text_index());
        let client = client(store);

        let built = PredicateBuilder::new(&client).build(&spec(&[("q", "lamp")])).await.unwrap();
        assert!(built.text_scored);

        let built = PredicateBuilder::new(&client)
            .with_text_index(false)
            .build(&spec(&[("q", "lamp")]))
            .await
            .unwrap();
        assert!(!built.text_scored);
        assert_eq!(built.predicate.text_query(), None);
    }
}
