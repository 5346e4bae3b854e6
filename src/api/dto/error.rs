//! Error response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "NOT_FOUND",
    "message": "category not found with id 7",
    "request_id": "8f0e7a9c-3c1a-4a53-9a8e-2f1f6a3c2b10"
}))]
pub struct ErrorResponse {
    /// Machine readable error code
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = serde_json::to_value(ErrorResponse::new("BAD_REQUEST", "nope")).unwrap();
        assert_eq!(body, json!({"code": "BAD_REQUEST", "message": "nope"}));
    }

    #[test]
    fn test_details_and_request_id() {
        let body = ErrorResponse::new("VALIDATION_ERROR", "invalid")
            .with_details(json!({"field": "name"}))
            .with_request_id("req-1");
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["details"]["field"], "name");
        assert_eq!(value["request_id"], "req-1");
    }
}
