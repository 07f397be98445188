//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing a ProductId where a CategoryId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A document identifier.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(UserId);

/// Length of a store object id in hex characters.
pub const OBJECT_ID_LEN: usize = 24;

/// Whether a token has the shape of a store object id (24 hex characters).
pub fn is_object_id(token: &str) -> bool {
    token.len() == OBJECT_ID_LEN && token.chars().all(|c| c.is_ascii_hexdigit())
}

impl CategoryId {
    /// Parse a token as a category id if it is id-shaped.
    pub fn parse(token: &str) -> Option<Self> {
        is_object_id(token).then(|| Self::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("prod-123");
        assert_eq!(id.as_str(), "prod-123");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = CategoryId::new("64b7f0c2a1e4d3b2c1a0f9e8");
        assert_eq!(
            serde_json::to_value(&id).unwrap(),
            serde_json::json!("64b7f0c2a1e4d3b2c1a0f9e8")
        );
    }

    #[test]
    fn test_object_id_shape() {
        assert!(is_object_id("64b7f0c2a1e4d3b2c1a0f9e8"));
        assert!(is_object_id("64B7F0C2A1E4D3B2C1A0F9E8"));
        assert!(!is_object_id("64b7f0c2a1e4d3b2c1a0f9e"));
        assert!(!is_object_id("Men"));
        assert!(!is_object_id("zzb7f0c2a1e4d3b2c1a0f9e8"));
    }

    #[test]
    fn test_category_parse() {
        assert!(CategoryId::parse("64b7f0c2a1e4d3b2c1a0f9e8").is_some());
        assert_eq!(CategoryId::parse("Women"), None);
    }
}
