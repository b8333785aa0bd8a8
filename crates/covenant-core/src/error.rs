//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout Covenant. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Configuration errors are programmer mistakes detected while a schema
//!   is built. They name the shape and field and abort the build; they are
//!   never produced while handling a request.
//! - Validation and precondition failures are not errors in this sense.
//!   They are collected as [`crate::ErrorDetail`] data.

use thiserror::Error;

/// Top-level error type for fallible Covenant operations.
#[derive(Error, Debug)]
pub enum CovenantError {
    /// A schema could not be built.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A document or schema could not be parsed.
    #[error("parse error for '{source_name}': {reason}")]
    Parse {
        /// File name or other identifier of the input.
        source_name: String,
        /// Reason parsing failed.
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A contradictory or unsupported schema definition.
///
/// Raised only during the one-time schema build. Cloneable so a memoized
/// build can hand the same failure to every caller of a broken shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `nullable:true` on an array or object field.
    #[error("{shape}.{field}: nullable is not currently supported on {kind} fields; use container-level configuration on the nested shape instead")]
    UnsupportedNullable {
        /// Shape that declares the field.
        shape: String,
        /// Declared field name.
        field: String,
        /// Kind of the field (`array` or `object`).
        kind: String,
    },

    /// A tag value could not be interpreted for the field's kind.
    #[error("{shape}.{field}: invalid value {value:?} for tag '{tag}': {reason}")]
    InvalidTag {
        /// Shape that declares the field.
        shape: String,
        /// Declared field name.
        field: String,
        /// Tag key.
        tag: String,
        /// Raw tag value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two declarations contradict each other.
    #[error("{shape}.{field}: {reason}")]
    Conflict {
        /// Shape that declares the field.
        shape: String,
        /// Declared field name.
        field: String,
        /// Description of the contradiction.
        reason: String,
    },

    /// A shape contains itself.
    #[error("shape '{shape}' is recursive via {chain}; recursive shapes are not supported")]
    RecursiveShape {
        /// Shape that was re-entered.
        shape: String,
        /// The chain of shapes leading back to it.
        chain: String,
    },

    /// A hand-authored schema document is malformed.
    #[error("invalid schema at '{path}': {reason}")]
    InvalidSchema {
        /// Pointer to the offending keyword inside the schema document.
        path: String,
        /// Why the keyword was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_wraps() {
        let err: CovenantError = ConfigurationError::RecursiveShape {
            shape: "Node".into(),
            chain: "Node -> Node".into(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("configuration error:"));
        assert!(msg.contains("Node -> Node"));
    }

    #[test]
    fn test_unsupported_nullable_message() {
        let err = ConfigurationError::UnsupportedNullable {
            shape: "Order".into(),
            field: "items".into(),
            kind: "array".into(),
        };
        assert!(err.to_string().contains("not currently supported"));
        assert!(err.to_string().starts_with("Order.items"));
    }
}
