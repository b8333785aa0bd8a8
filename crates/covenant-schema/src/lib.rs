//! # covenant-schema: Schema Inference and Validation
//!
//! Turns annotated shape descriptions into immutable [`SchemaNode`] trees and
//! validates decoded payloads against them.
//!
//! ## Pipeline
//!
//! ```text
//! Shape::describe() ──► infer ──► Arc<SchemaNode> ──► Validator ──► Vec<ErrorDetail>
//!                        ▲                              ▲
//!                 SchemaRegistry                  FormatRegistry
//!               (one build per shape)          (named string checkers)
//! ```
//!
//! Hand-authored JSON Schema documents enter the same pipeline through
//! [`SchemaNode::from_value`].
//!
//! ## Key Design Principles
//!
//! 1. **Misconfiguration fails at build time.** Unsupported nullability,
//!    malformed tags and contradictory bounds are [`ConfigurationError`]s
//!    raised while inferring, never while validating.
//!
//! 2. **Built trees are immutable and shared.** The registry hands out
//!    `Arc<SchemaNode>`; concurrent first requests for a shape observe one
//!    build.
//!
//! 3. **Validation is exhaustive.** Every independent violation is reported
//!    with its location. An empty list is the only success signal.
//!
//! [`ConfigurationError`]: covenant_core::ConfigurationError

pub mod authored;
pub mod formats;
pub mod infer;
pub mod model;
pub mod shape;
pub mod validate;

pub use formats::{FormatCheck, FormatRegistry};
pub use infer::{infer_shape, infer_shape_with, schema_for, BuildResult, InferenceConfig, SchemaRegistry};
pub use model::{AdditionalProperties, Combinator, Kind, Pattern, SchemaNode};
pub use shape::{FieldDescriptor, FieldType, Shape, ShapeDescriptor, ShapeRef};
pub use validate::{json_equal, ValidationMode, Validator};
