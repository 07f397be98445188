//! Sort resolution.

use turbo_db::SortSpec;

use crate::catalog::product_fields as f;
use crate::search::filter::SortKey;

/// Resolve a sort key into a store ordering.
///
/// Relevance needs a query: without one it falls back to newest first.
/// With one, the text score leads when the store scored the query. Every
/// ordering ends on the product id so equal keys stay deterministic.
pub fn resolve_sort(key: SortKey, has_query: bool, text_scored: bool) -> SortSpec {
    let spec = match key {
        SortKey::PriceLow => SortSpec::asc(f::PRICE),
        SortKey::PriceHigh => SortSpec::desc(f::PRICE),
        SortKey::Rating => SortSpec::desc(f::RATING).then_desc(f::RATING_COUNT),
        SortKey::Newest => newest(),
        SortKey::Popular => SortSpec::desc(f::RATING_COUNT).then_desc(f::RATING),
        SortKey::Name => SortSpec::asc(f::NAME),
        SortKey::Relevance if !has_query => newest(),
        SortKey::Relevance => {
            let lead = if text_scored {
                SortSpec::new().then_text_score()
            } else {
                SortSpec::new()
            };
            lead.then_desc(f::RATING)
                .then_desc(f::RATING_COUNT)
                .then_desc(f::CREATED_AT)
        }
    };
    spec.then_asc(f::ID)
}

fn newest() -> SortSpec {
    SortSpec::desc(f::CREATED_AT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use turbo_db::{Direction, SortField};

    fn fields(spec: &SortSpec) -> Vec<(String, Direction)> {
        spec.keys()
            .iter()
            .map(|k| match &k.field {
                SortField::Field(name) => (name.clone(), k.direction),
                SortField::TextScore => ("$score".to_string(), k.direction),
            })
            .collect()
    }

    #[test]
    fn test_relevance_without_query_is_newest() {
        assert_eq!(
            resolve_sort(SortKey::Relevance, false, false),
            resolve_sort(SortKey::Newest, false, false)
        );
        assert_eq!(
            resolve_sort(SortKey::Relevance, false, true),
            resolve_sort(SortKey::Newest, true, true)
        );
    }

    #[test]
    fn test_relevance_with_text_score() {
        let spec = resolve_sort(SortKey::Relevance, true, true);
        assert!(spec.uses_text_score());
        assert_eq!(spec.keys().len(), 5);
    }

    #[test]
    fn test_relevance_fallback_chain() {
        let spec = resolve_sort(SortKey::Relevance, true, false);
        assert!(!spec.uses_text_score());
        assert_eq!(
            fields(&spec),
            vec![
                ("rating".to_string(), Direction::Desc),
                ("ratingCount".to_string(), Direction::Desc),
                ("createdAt".to_string(), Direction::Desc),
                ("id".to_string(), Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_popular_and_price() {
        assert_eq!(
            fields(&resolve_sort(SortKey::Popular, false, false))[..2],
            [
                ("ratingCount".to_string(), Direction::Desc),
                ("rating".to_string(), Direction::Desc),
            ]
        );
        assert_eq!(
            fields(&resolve_sort(SortKey::PriceLow, true, true))[0],
            ("price".to_string(), Direction::Asc)
        );
    }
}
