//! Document and value types and conversions.

use crate::DbError;
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;

pub use serde_json::Value;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Deserialize a document into a typed record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, DbError> {
    serde_json::from_value(Value::Object(document))
        .map_err(|e| DbError::DeserializeError(e.to_string()))
}

/// Deserialize a batch of documents.
pub fn deserialize_all<T: DeserializeOwned>(documents: Vec<Document>) -> Result<Vec<T>, DbError> {
    documents.into_iter().map(from_document).collect()
}

/// Serialize a typed record into a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, DbError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::TypeError(format!(
            "expected an object, got {}",
            kind_name(&other)
        ))),
    }
}

/// The values a field resolves to. Arrays expand to their elements; a
/// missing or null field resolves to nothing.
pub fn field_values<'a>(document: &'a Document, field: &str) -> Vec<&'a Value> {
    match document.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value) => vec![value],
    }
}

/// Compare two scalar values of the same kind.
///
/// Returns `None` for mixed kinds and for arrays/objects.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Equality with numeric coercion (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Total order used when sorting documents by a field.
///
/// Missing and null sort first, then numbers, strings, objects, arrays, and
/// booleans last.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }

    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_field_values_expand_arrays() {
        let d = doc(json!({"colors": ["red", "blue"], "name": "Shirt", "gone": null}));
        assert_eq!(field_values(&d, "colors").len(), 2);
        assert_eq!(field_values(&d, "name"), vec![&json!("Shirt")]);
        assert!(field_values(&d, "gone").is_empty());
        assert!(field_values(&d, "missing").is_empty());
    }

    #[test]
    fn test_numeric_equality_coerces() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_sort_order_puts_missing_first() {
        let one = json!(1);
        let text = json!("a");
        assert_eq!(sort_order(None, Some(&one)), Ordering::Less);
        assert_eq!(sort_order(Some(&one), Some(&text)), Ordering::Less);
        assert_eq!(sort_order(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
    }

    #[test]
    fn test_document_roundtrip_through_serde() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Item {
            name: String,
            price: f64,
        }

        let item = Item {
            name: "Mug".to_string(),
            price: 12.5,
        };
        let d = to_document(&item).unwrap();
        assert_eq!(d.get("price"), Some(&json!(12.5)));
        let back: Item = from_document(d).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_to_document_rejects_scalars() {
        assert!(matches!(to_document(&5), Err(DbError::TypeError(_))));
    }
}
