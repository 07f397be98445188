//! Response envelopes.

use serde::Serialize;

use crate::error::SearchError;

/// The `{success, data, message}` envelope every read endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// A failure envelope with the generic user-facing message.
    pub fn failure(error: &SearchError) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(error.user_message().to_string()),
        }
    }

    pub fn from_result(result: Result<T, SearchError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SearchError>
    where
        T: Serialize,
    {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json: serde_json::Value =
            serde_json::from_str(&ApiResponse::ok(vec![1, 2]).to_json().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failure_hides_detail() {
        let err = SearchError::unavailable("products count timed out after 2s");
        let response: ApiResponse<()> = ApiResponse::from_result(Err(err));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Search failed");
        assert!(json.get("data").is_none());
        assert!(!json.to_string().contains("timed out"));
    }
}
