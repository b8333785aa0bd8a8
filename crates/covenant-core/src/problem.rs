//! # Problem Bodies
//!
//! [`ErrorModel`] is the response body transport layers render when a
//! request is rejected with error details. It follows the RFC 9457 problem
//! shape with an added `errors` array of [`ErrorDetail`]s.

use serde::{Deserialize, Serialize};

use crate::detail::ErrorDetail;

/// Problem-details response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    /// URI reference identifying the problem type.
    #[serde(rename = "type", default = "about_blank")]
    pub kind: String,
    /// Short summary, normally the status text.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Individual located violations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

fn about_blank() -> String {
    "about:blank".to_string()
}

impl ErrorModel {
    /// Create a problem body for an arbitrary status.
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: about_blank(),
            title: title.into(),
            status,
            detail: detail.into(),
            errors: Vec::new(),
        }
    }

    /// `422 Unprocessable Entity` carrying validation errors.
    pub fn validation_failed(errors: Vec<ErrorDetail>) -> Self {
        Self {
            errors,
            ..Self::new(422, "Unprocessable Entity", "validation failed")
        }
    }

    /// `412 Precondition Failed` carrying precondition errors.
    pub fn precondition_failed(errors: Vec<ErrorDetail>) -> Self {
        Self {
            errors,
            ..Self::new(412, "Precondition Failed", "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_body() {
        let body = ErrorModel::validation_failed(vec![ErrorDetail::new(
            "expected string",
            "request.body.name",
        )]);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["type"], "about:blank");
        assert_eq!(v["status"], 422);
        assert_eq!(v["title"], "Unprocessable Entity");
        assert_eq!(v["errors"][0]["location"], "request.body.name");
    }

    #[test]
    fn test_empty_fields_omitted() {
        let body = ErrorModel::precondition_failed(Vec::new());
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("detail").is_none());
        assert!(v.get("errors").is_none());
        assert_eq!(v["status"], 412);
    }

    #[test]
    fn test_deserialize_defaults_type() {
        let body: ErrorModel =
            serde_json::from_str(r#"{"title":"Not Found","status":404}"#).unwrap();
        assert_eq!(body.kind, "about:blank");
        assert!(body.errors.is_empty());
    }
}
