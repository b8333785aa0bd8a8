//! # Error Details: Located Violations
//!
//! An [`ErrorDetail`] describes one independent violation: what went wrong,
//! where in the request or response it happened, and the offending value.
//!
//! ## Location Syntax
//!
//! Locations are root-relative pointers. Object members are joined with
//! `.` and array elements use `[index]`:
//!
//! ```text
//! request.body.items[2].name
//! request.headers.If-Match
//! ```
//!
//! This syntax is consumed by client tooling and must not change.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single located violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable description of the violation.
    pub message: String,
    /// Root-relative pointer to the violating element.
    pub location: String,
    /// The offending value, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ErrorDetail {
    /// Create an error detail without an attached value.
    pub fn new(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
            value: None,
        }
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// A root-relative pointer into a value tree.
///
/// Cheap to extend: each descent produces a new `Location` so sibling
/// paths never observe one another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location(String);

impl Location {
    /// Create a location rooted at `root` (e.g. `"request.body"`).
    /// An empty root produces bare member names.
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    /// The location of an object member.
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// The location of an array element.
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Borrow the rendered pointer.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an [`ErrorDetail`] at this location.
    pub fn error(&self, message: impl Into<String>) -> ErrorDetail {
        ErrorDetail::new(message, self.0.clone())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(root: &str) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_location_syntax() {
        let loc = Location::new("request.body").field("items").index(2).field("name");
        assert_eq!(loc.as_str(), "request.body.items[2].name");
    }

    #[test]
    fn test_empty_root_uses_bare_names() {
        let loc = Location::default().field("name");
        assert_eq!(loc.as_str(), "name");
        assert_eq!(Location::default().index(0).as_str(), "[0]");
    }

    #[test]
    fn test_error_detail_omits_absent_value() {
        let detail = Location::new("body").error("expected string");
        let s = serde_json::to_string(&detail).unwrap();
        assert_eq!(s, r#"{"message":"expected string","location":"body"}"#);
    }

    #[test]
    fn test_error_detail_serializes_value() {
        let detail = ErrorDetail::new("expected number >= 5", "body.count").with_value(json!(3));
        let v = serde_json::to_value(&detail).unwrap();
        assert_eq!(v["value"], 3);
        assert_eq!(detail.to_string(), "body.count: expected number >= 5");
    }

    #[test]
    fn test_display_root() {
        let detail = ErrorDetail::new("expected object", "");
        assert!(detail.to_string().contains("(root)"));
    }
}
