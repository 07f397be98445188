//! Store-native predicates, orderings, and updates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::Value;

/// How a case-insensitive string match is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Pattern occurs anywhere in the value.
    Contains,
    /// Value begins with the pattern.
    StartsWith,
    /// Value equals the pattern.
    Exact,
}

impl MatchMode {
    /// Test `text` against `pattern`, ignoring case.
    pub fn matches(&self, text: &str, pattern: &str) -> bool {
        let text = text.to_lowercase();
        let pattern = pattern.to_lowercase();
        match self {
            MatchMode::Contains => text.contains(&pattern),
            MatchMode::StartsWith => text.starts_with(&pattern),
            MatchMode::Exact => text == pattern,
        }
    }
}

/// Ordering comparison used by range predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Whether `ordering` (field value compared to the bound) satisfies this op.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A filter expression evaluated by the store, equivalent to a WHERE clause.
///
/// Array-valued fields match when any element matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every document.
    All,
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field compares against a bound.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Field equals any of the values.
    In { field: String, values: Vec<Value> },
    /// Case-insensitive string match.
    Matches {
        field: String,
        pattern: String,
        mode: MatchMode,
    },
    /// Weighted text-index search. Requires a text index on the collection.
    TextSearch(String),
    /// All sub-predicates match.
    And(Vec<Predicate>),
    /// At least one sub-predicate matches.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
        }
    }

    pub fn matches(field: impl Into<String>, pattern: impl Into<String>, mode: MatchMode) -> Self {
        Predicate::Matches {
            field: field.into(),
            pattern: pattern.into(),
            mode,
        }
    }

    pub fn contains(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::matches(field, pattern, MatchMode::Contains)
    }

    pub fn text(query: impl Into<String>) -> Self {
        Predicate::TextSearch(query.into())
    }

    /// Conjunction. Nested conjunctions are flattened and `All` is dropped.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            match predicate {
                Predicate::All => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Or(predicates)
    }

    /// The text-search query contained in this predicate, if any.
    pub fn text_query(&self) -> Option<&str> {
        match self {
            Predicate::TextSearch(q) => Some(q),
            Predicate::And(ps) | Predicate::Or(ps) => ps.iter().find_map(|p| p.text_query()),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

/// What a sort key orders by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    /// A document field.
    Field(String),
    /// The text-index score of the current text search (0 without one).
    TextScore,
}

/// One component of an ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

/// A lexicographic ordering over several keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new().then_asc(field)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new().then_desc(field)
    }

    pub fn then_asc(self, field: impl Into<String>) -> Self {
        self.then(SortField::Field(field.into()), Direction::Asc)
    }

    pub fn then_desc(self, field: impl Into<String>) -> Self {
        self.then(SortField::Field(field.into()), Direction::Desc)
    }

    pub fn then_text_score(self) -> Self {
        self.then(SortField::TextScore, Direction::Desc)
    }

    pub fn then(mut self, field: SortField, direction: Direction) -> Self {
        self.keys.push(SortKey { field, direction });
        self
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether this ordering uses the text score.
    pub fn uses_text_score(&self) -> bool {
        self.keys.iter().any(|k| k.field == SortField::TextScore)
    }
}

/// Options for a `find` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document update applied by `update_many`.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Add `by` to a numeric field (missing counts as 0).
    Increment { field: String, by: i64 },
}

impl Update {
    pub fn increment(field: impl Into<String>, by: i64) -> Self {
        Update::Increment {
            field: field.into(),
            by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_modes_ignore_case() {
        assert!(MatchMode::Contains.matches("Blue Shirt", "SHIRT"));
        assert!(MatchMode::StartsWith.matches("Nike Air", "ni"));
        assert!(!MatchMode::StartsWith.matches("Air Nike", "ni"));
        assert!(MatchMode::Exact.matches("Men", "men"));
        assert!(!MatchMode::Exact.matches("Menswear", "men"));
    }

    #[test]
    fn test_compare_ops_are_inclusive_where_expected() {
        assert!(CompareOp::Gte.accepts(Ordering::Equal));
        assert!(CompareOp::Lte.accepts(Ordering::Equal));
        assert!(!CompareOp::Gt.accepts(Ordering::Equal));
        assert!(CompareOp::Lt.accepts(Ordering::Less));
    }

    #[test]
    fn test_and_flattens() {
        let p = Predicate::and(vec![
            Predicate::All,
            Predicate::and(vec![Predicate::eq("a", 1), Predicate::eq("b", 2)]),
            Predicate::eq("c", 3),
        ]);
        match p {
            Predicate::And(inner) => assert_eq!(inner.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Predicate::and(vec![Predicate::All]), Predicate::All);
    }

    #[test]
    fn test_text_query_is_found_in_tree() {
        let p = Predicate::and(vec![Predicate::eq("isActive", true), Predicate::text("shirt")]);
        assert_eq!(p.text_query(), Some("shirt"));
        assert_eq!(Predicate::eq("a", 1).text_query(), None);
    }

    #[test]
    fn test_sort_spec_builder() {
        let spec = SortSpec::new().then_text_score().then_desc("rating");
        assert!(spec.uses_text_score());
        assert_eq!(spec.keys().len(), 2);
        assert!(!SortSpec::asc("name").uses_text_score());
    }
}
