//! Grouped aggregation over matching documents.

use std::cmp::Ordering;

use crate::types::{compare_values, field_values, sort_order, values_equal, Document, Value};

/// Field holding the group key in aggregation output.
pub const GROUP_KEY: &str = "_id";

/// An accumulator computed per group.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Number of documents in the group.
    Count,
    /// Sum of a numeric field.
    Sum(String),
    /// Average of a numeric field (null when no document has one).
    Avg(String),
    /// Smallest value of a field.
    Min(String),
    /// Largest value of a field.
    Max(String),
    /// Distinct values of a field; array fields contribute every element.
    AddToSet(String),
    /// Distinct values of the first element of an array field, one per document.
    AddFirstToSet(String),
    /// First present value of a field (first element for arrays).
    First(String),
}

/// A single-pass aggregation: optional grouping plus named accumulators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub group_by: Option<String>,
    pub accumulators: Vec<(String, Accumulator)>,
}

impl Aggregation {
    /// Aggregate all matching documents into one group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group matching documents by a field.
    pub fn group_by(field: impl Into<String>) -> Self {
        Self {
            group_by: Some(field.into()),
            accumulators: Vec::new(),
        }
    }

    /// Add a named accumulator.
    pub fn with(mut self, name: impl Into<String>, accumulator: Accumulator) -> Self {
        self.accumulators.push((name.into(), accumulator));
        self
    }

    /// Evaluate against documents that already passed the predicate.
    ///
    /// Groups are emitted in order of first appearance. No documents yields
    /// no groups, even without a `group_by`.
    pub fn evaluate<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> Vec<Document> {
        let mut groups: Vec<(Value, Vec<State>)> = Vec::new();

        for document in documents {
            let key = match &self.group_by {
                Some(field) => document.get(field).cloned().unwrap_or(Value::Null),
                None => Value::Null,
            };
            let index = match groups.iter().position(|(k, _)| k == &key) {
                Some(i) => i,
                None => {
                    let states = self.accumulators.iter().map(|(_, a)| State::new(a)).collect();
                    groups.push((key, states));
                    groups.len() - 1
                }
            };
            let states = &mut groups[index].1;
            for ((_, accumulator), state) in self.accumulators.iter().zip(states.iter_mut()) {
                state.feed(accumulator, document);
            }
        }

        groups
            .into_iter()
            .map(|(key, states)| {
                let mut out = Document::new();
                out.insert(GROUP_KEY.to_string(), key);
                for ((name, _), state) in self.accumulators.iter().zip(states) {
                    out.insert(name.clone(), state.finish());
                }
                out
            })
            .collect()
    }
}

enum State {
    Count(u64),
    Sum(f64),
    Avg { sum: f64, n: u64 },
    Extreme { best: Option<Value>, keep: Ordering },
    Set(Vec<Value>),
    First(Option<Value>),
}

impl State {
    fn new(accumulator: &Accumulator) -> Self {
        match accumulator {
            Accumulator::Count => State::Count(0),
            Accumulator::Sum(_) => State::Sum(0.0),
            Accumulator::Avg(_) => State::Avg { sum: 0.0, n: 0 },
            Accumulator::Min(_) => State::Extreme {
                best: None,
                keep: Ordering::Less,
            },
            Accumulator::Max(_) => State::Extreme {
                best: None,
                keep: Ordering::Greater,
            },
            Accumulator::AddToSet(_) | Accumulator::AddFirstToSet(_) => State::Set(Vec::new()),
            Accumulator::First(_) => State::First(None),
        }
    }

    fn feed(&mut self, accumulator: &Accumulator, document: &Document) {
        match (self, accumulator) {
            (State::Count(n), _) => *n += 1,
            (State::Sum(total), Accumulator::Sum(field)) => {
                *total += numbers(document, field).sum::<f64>();
            }
            (State::Avg { sum, n }, Accumulator::Avg(field)) => {
                for x in numbers(document, field) {
                    *sum += x;
                    *n += 1;
                }
            }
            (State::Extreme { best, keep }, Accumulator::Min(field) | Accumulator::Max(field)) => {
                for value in field_values(document, field) {
                    let replace = match best.as_ref() {
                        None => true,
                        Some(current) => sort_order(Some(value), Some(current)) == *keep,
                    };
                    if replace {
                        *best = Some(value.clone());
                    }
                }
            }
            (State::Set(items), Accumulator::AddToSet(field)) => {
                for value in field_values(document, field) {
                    push_distinct(items, value);
                }
            }
            (State::Set(items), Accumulator::AddFirstToSet(field)) => {
                if let Some(value) = field_values(document, field).first() {
                    push_distinct(items, value);
                }
            }
            (State::First(slot), Accumulator::First(field)) => {
                if slot.is_none() {
                    *slot = field_values(document, field).first().map(|v| (*v).clone());
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Value {
        match self {
            State::Count(n) => Value::from(n),
            State::Sum(total) => Value::from(total),
            State::Avg { sum, n } if n > 0 => Value::from(sum / n as f64),
            State::Avg { .. } => Value::Null,
            State::Extreme { best, .. } => best.unwrap_or(Value::Null),
            State::Set(items) => Value::Array(items),
            State::First(value) => value.unwrap_or(Value::Null),
        }
    }
}

fn numbers<'a>(document: &'a Document, field: &str) -> impl Iterator<Item = f64> + 'a {
    field_values(document, field)
        .into_iter()
        .filter_map(|v| v.as_f64())
}

fn push_distinct(items: &mut Vec<Value>, value: &Value) {
    let present = items
        .iter()
        .any(|existing| existing == value || values_equal(existing, value));
    if !present {
        items.push(value.clone());
    }
}

/// Order two aggregation rows by a field, descending.
pub fn desc_by(field: &str) -> impl Fn(&Document, &Document) -> Ordering + '_ {
    move |a, b| {
        match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => compare_values(y, x).unwrap_or(Ordering::Equal),
            _ => sort_order(b.get(field), a.get(field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<Value>) -> Vec<Document> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_group_statistics() {
        let data = docs(vec![
            json!({"brand": "Acme", "price": 10.0, "rating": 4.0, "colors": ["red", "blue"]}),
            json!({"brand": "Acme", "price": 30.0, "rating": 5.0, "colors": ["green"]}),
            json!({"brand": "Zeta", "price": 20.0, "colors": []}),
        ]);
        let agg = Aggregation::new()
            .with("brands", Accumulator::AddToSet("brand".into()))
            .with("colors", Accumulator::AddFirstToSet("colors".into()))
            .with("minPrice", Accumulator::Min("price".into()))
            .with("maxPrice", Accumulator::Max("price".into()))
            .with("avgRating", Accumulator::Avg("rating".into()))
            .with("total", Accumulator::Count);

        let rows = agg.evaluate(&data);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["brands"], json!(["Acme", "Zeta"]));
        assert_eq!(row["colors"], json!(["red", "green"]));
        assert_eq!(row["minPrice"], json!(10.0));
        assert_eq!(row["maxPrice"], json!(30.0));
        assert_eq!(row["avgRating"], json!(4.5));
        assert_eq!(row["total"], json!(3));
    }

    #[test]
    fn test_no_documents_yields_no_groups() {
        let agg = Aggregation::new().with("total", Accumulator::Count);
        assert!(agg.evaluate(&Vec::<Document>::new()).is_empty());
    }

    #[test]
    fn test_group_by_field() {
        let data = docs(vec![
            json!({"brand": "Nike", "price": 100.0, "images": ["a.jpg"]}),
            json!({"brand": "Puma", "price": 50.0}),
            json!({"brand": "Nike", "price": 50.0, "images": ["b.jpg"]}),
        ]);
        let agg = Aggregation::group_by("brand")
            .with("count", Accumulator::Count)
            .with("avgPrice", Accumulator::Avg("price".into()))
            .with("image", Accumulator::First("images".into()));

        let mut rows = agg.evaluate(&data);
        rows.sort_by(desc_by("count"));
        assert_eq!(rows[0][GROUP_KEY], json!("Nike"));
        assert_eq!(rows[0]["count"], json!(2));
        assert_eq!(rows[0]["avgPrice"], json!(75.0));
        assert_eq!(rows[0]["image"], json!("a.jpg"));
        assert_eq!(rows[1]["image"], Value::Null);
    }
}
