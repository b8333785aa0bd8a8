//! # Schema Inference
//!
//! Builds an immutable [`SchemaNode`] tree from a [`ShapeDescriptor`],
//! resolving every annotation once so no metadata lookup happens while a
//! request is validated.
//!
//! ## Field Resolution
//!
//! Each field is resolved with ordered rule chains, first match wins:
//!
//! - **Required:** explicit `required` tag, else optional if the field is
//!   omit-when-empty (or the registry makes fields optional by default),
//!   else required.
//! - **Nullable:** explicit `nullable` tag (`true` is only legal on scalar
//!   kinds), else nullable if the field is an optional reference to a scalar
//!   and not omit-when-empty, else not nullable. Optional references to
//!   arrays or objects are never nullable by inference.
//!
//! Contradictory or unsupported declarations fail the build with a
//! [`ConfigurationError`].
//!
//! ## Memoization
//!
//! [`SchemaRegistry`] keys built trees by `TypeId`. The first caller for a
//! shape runs the build; concurrent callers block on the same cell and
//! receive the same `Arc`. A failed build is cached too, so every caller of
//! a misconfigured shape sees the same error. Nested shapes are built inline
//! by the owning build and never re-enter the registry.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use covenant_core::ConfigurationError;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use serde_json::Value;

use crate::model::{AdditionalProperties, Kind, Pattern, SchemaNode};
use crate::shape::{FieldDescriptor, FieldType, Shape, ShapeDescriptor, ShapeRef};
use crate::validate::Validator;

/// Outcome of a memoized build.
pub type BuildResult = Result<Arc<SchemaNode>, ConfigurationError>;

/// Inference options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceConfig {
    /// Fields without an explicit `required` tag are optional.
    pub fields_optional_by_default: bool,
}

/// Build a schema from a description with the default configuration.
pub fn infer_shape(desc: &ShapeDescriptor) -> Result<SchemaNode, ConfigurationError> {
    infer_shape_with(desc, &InferenceConfig::default())
}

/// Build a schema from a description.
pub fn infer_shape_with(
    desc: &ShapeDescriptor,
    config: &InferenceConfig,
) -> Result<SchemaNode, ConfigurationError> {
    Builder::new(config).shape(desc, None)
}

/// Build (or fetch) the schema for `T` from the process-wide registry.
pub fn schema_for<T: Shape>() -> BuildResult {
    SchemaRegistry::global().infer::<T>()
}

/// Memoized schema builds keyed by shape identity.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    config: InferenceConfig,
    cells: RwLock<HashMap<TypeId, Arc<OnceCell<BuildResult>>>>,
    builds: AtomicUsize,
}

static GLOBAL: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

impl SchemaRegistry {
    /// An empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with the given configuration.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL
    }

    /// The schema for `T`, built on first use.
    pub fn infer<T: Shape>(&self) -> BuildResult {
        self.infer_ref(ShapeRef::of::<T>())
    }

    /// The schema for a referenced shape, built on first use.
    pub fn infer_ref(&self, shape: ShapeRef) -> BuildResult {
        let cell = self.cell(shape.id());
        cell.get_or_init(|| self.build(shape)).clone()
    }

    /// Number of builds executed so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Number of shapes with a cell (built, failed, or in progress).
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Returns true if no shape has been requested.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, id: TypeId) -> Arc<OnceCell<BuildResult>> {
        if let Some(cell) = self.cells.read().get(&id) {
            return Arc::clone(cell);
        }
        Arc::clone(self.cells.write().entry(id).or_default())
    }

    fn build(&self, shape: ShapeRef) -> BuildResult {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let desc = shape.describe();
        tracing::debug!(shape = %desc.name, "building schema");
        let result = Builder::new(&self.config)
            .shape(&desc, Some(shape.id()))
            .map(Arc::new);
        match &result {
            Ok(node) => tracing::debug!(
                shape = %desc.name,
                properties = node.properties.len(),
                "schema built"
            ),
            Err(e) => tracing::warn!(shape = %desc.name, error = %e, "schema configuration error"),
        }
        result
    }
}

/// Names used in configuration errors for the field being resolved.
struct FieldContext<'a> {
    shape: &'a str,
    field: &'a str,
}

impl FieldContext<'_> {
    fn invalid(&self, tag: &str, value: &str, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::InvalidTag {
            shape: self.shape.to_string(),
            field: self.field.to_string(),
            tag: tag.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn conflict(&self, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::Conflict {
            shape: self.shape.to_string(),
            field: self.field.to_string(),
            reason: reason.into(),
        }
    }

    fn require_kind(&self, tag: &str, actual: Kind, allowed: &[Kind]) -> Result<(), ConfigurationError> {
        if allowed.contains(&actual) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(Kind::as_str).collect();
        Err(self.conflict(format!(
            "tag '{tag}' applies to {} fields, not {actual}",
            names.join(" or ")
        )))
    }

    fn bool_tag(&self, tag: &str, raw: &str) -> Result<bool, ConfigurationError> {
        raw.parse::<bool>()
            .map_err(|_| self.invalid(tag, raw, "expected true or false"))
    }

    fn number_tag(&self, tag: &str, raw: &str) -> Result<f64, ConfigurationError> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid(tag, raw, "expected a finite number"))
    }

    fn count_tag(&self, tag: &str, raw: &str) -> Result<usize, ConfigurationError> {
        raw.trim()
            .parse::<usize>()
            .map_err(|_| self.invalid(tag, raw, "expected a non-negative integer"))
    }

    fn scalar(&self, tag: &str, kind: Kind, raw: &str) -> Result<Value, ConfigurationError> {
        parse_scalar(kind, raw).map_err(|reason| self.invalid(tag, raw, reason))
    }
}

const NUMERIC: &[Kind] = &[Kind::Integer, Kind::Number];

struct Builder<'c> {
    config: &'c InferenceConfig,
    stack: Vec<(TypeId, String)>,
}

impl<'c> Builder<'c> {
    fn new(config: &'c InferenceConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
        }
    }

    fn shape(&mut self, desc: &ShapeDescriptor, id: Option<TypeId>) -> Result<SchemaNode, ConfigurationError> {
        let Some(id) = id else {
            return self.object(desc);
        };
        if let Some(pos) = self.stack.iter().position(|(seen, _)| *seen == id) {
            let mut chain: Vec<&str> = self.stack[pos..].iter().map(|(_, n)| n.as_str()).collect();
            chain.push(&desc.name);
            return Err(ConfigurationError::RecursiveShape {
                shape: desc.name.clone(),
                chain: chain.join(" -> "),
            });
        }
        self.stack.push((id, desc.name.clone()));
        let result = self.object(desc);
        self.stack.pop();
        result
    }

    fn object(&mut self, desc: &ShapeDescriptor) -> Result<SchemaNode, ConfigurationError> {
        let mut node = SchemaNode {
            description: desc.doc.clone(),
            nullable: desc.nullable,
            additional_properties: if desc.additional_properties {
                AdditionalProperties::Allow
            } else {
                AdditionalProperties::Deny
            },
            ..SchemaNode::of_kind(Kind::Object)
        };

        for field in desc.fields.iter().filter(|f| !f.ignored) {
            let ctx = FieldContext {
                shape: &desc.name,
                field: &field.name,
            };
            let name = field.external_name().to_string();
            if node.property(&name).is_some() {
                return Err(ctx.conflict(format!("external name '{name}' is declared more than once")));
            }

            let (property, required) = self.field(field, &ctx)?;

            if required {
                node.required.push(name.clone());
            }
            if let Some(raw) = field.tag_value("dependentRequired") {
                let deps = split_list(raw);
                if deps.is_empty() {
                    return Err(ctx.invalid(
                        "dependentRequired",
                        raw,
                        "expected a comma-separated list of field names",
                    ));
                }
                node.dependent_required.push((name.clone(), deps));
            }
            node.properties.push((name, property));
        }

        for (name, deps) in &node.dependent_required {
            if let Some(missing) = deps.iter().find(|d| node.property(d).is_none()) {
                return Err(ConfigurationError::Conflict {
                    shape: desc.name.clone(),
                    field: name.clone(),
                    reason: format!("dependentRequired names unknown field '{missing}'"),
                });
            }
        }

        Ok(node)
    }

    fn field(
        &mut self,
        field: &FieldDescriptor,
        ctx: &FieldContext<'_>,
    ) -> Result<(SchemaNode, bool), ConfigurationError> {
        let (optional_slot, ty) = match &field.ty {
            FieldType::Optional(inner) => (true, inner.as_ref()),
            other => (false, other),
        };
        let kind = kind_of(ty);
        let mut node = self.type_node(ty, ctx)?;

        apply_tags(&mut node, kind, field, ctx)?;

        let required = match field.tag_value("required") {
            Some(raw) => ctx.bool_tag("required", raw)?,
            None => !(field.omit_empty || self.config.fields_optional_by_default),
        };

        match field.tag_value("nullable") {
            Some(raw) => {
                let nullable = ctx.bool_tag("nullable", raw)?;
                if nullable && !kind.is_scalar() {
                    return Err(ConfigurationError::UnsupportedNullable {
                        shape: ctx.shape.to_string(),
                        field: ctx.field.to_string(),
                        kind: kind.to_string(),
                    });
                }
                node.nullable = nullable;
            }
            None => {
                if optional_slot && kind.is_scalar() && !field.omit_empty {
                    node.nullable = true;
                }
            }
        }

        if let Some(default) = &node.default_value {
            let errors = Validator::default().validate(&node, default, "");
            if let Some(first) = errors.first() {
                return Err(ctx.conflict(format!(
                    "default value does not satisfy the field's own constraints: {}",
                    first.message
                )));
            }
        }

        Ok((node, required))
    }

    fn type_node(&mut self, ty: &FieldType, ctx: &FieldContext<'_>) -> Result<SchemaNode, ConfigurationError> {
        Ok(match ty {
            FieldType::Boolean => SchemaNode::of_kind(Kind::Boolean),
            FieldType::Integer => SchemaNode::of_kind(Kind::Integer),
            FieldType::Number => SchemaNode::of_kind(Kind::Number),
            FieldType::String => SchemaNode::of_kind(Kind::String),
            FieldType::Array(inner) => {
                let items = match inner.as_ref() {
                    FieldType::Optional(element) => {
                        let mut items = self.type_node(element, ctx)?;
                        if kind_of(element).is_scalar() {
                            items.nullable = true;
                        }
                        items
                    }
                    element => self.type_node(element, ctx)?,
                };
                SchemaNode {
                    items: Some(Box::new(items)),
                    ..SchemaNode::of_kind(Kind::Array)
                }
            }
            FieldType::Object(shape) => {
                let desc = shape.describe();
                self.shape(&desc, Some(shape.id()))?
            }
            FieldType::Optional(_) => {
                return Err(ctx.conflict("an optional reference to an optional reference is not supported"));
            }
        })
    }
}

fn kind_of(ty: &FieldType) -> Kind {
    match ty {
        FieldType::Boolean => Kind::Boolean,
        FieldType::Integer => Kind::Integer,
        FieldType::Number => Kind::Number,
        FieldType::String => Kind::String,
        FieldType::Array(_) => Kind::Array,
        FieldType::Object(_) => Kind::Object,
        FieldType::Optional(inner) => kind_of(inner),
    }
}

fn apply_tags(
    node: &mut SchemaNode,
    kind: Kind,
    field: &FieldDescriptor,
    ctx: &FieldContext<'_>,
) -> Result<(), ConfigurationError> {
    for (key, raw) in &field.tags {
        let tag = key.as_str();
        match tag {
            // Resolved by the caller.
            "required" | "nullable" | "dependentRequired" => {}
            "doc" => node.description = Some(raw.clone()),
            "format" => node.format = Some(raw.clone()),
            "enum" => {
                let target = match kind {
                    Kind::Array => node.items.as_deref_mut(),
                    _ => Some(&mut *node),
                };
                let Some(target) = target else {
                    return Err(ctx.invalid(tag, raw, "array field has no item schema"));
                };
                let item_kind = target.kind.unwrap_or(Kind::Object);
                if !item_kind.is_scalar() {
                    return Err(ctx.invalid(tag, raw, format!("enum is not supported on {item_kind} values")));
                }
                target.enum_values = split_list(raw)
                    .iter()
                    .map(|v| ctx.scalar(tag, item_kind, v))
                    .collect::<Result<_, _>>()?;
            }
            "default" => node.default_value = Some(ctx.scalar(tag, kind, raw)?),
            "example" => node.examples.push(ctx.scalar(tag, kind, raw)?),
            "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" | "multipleOf" => {
                ctx.require_kind(tag, kind, NUMERIC)?;
                let n = ctx.number_tag(tag, raw)?;
                match tag {
                    "minimum" => node.minimum = Some(n),
                    "maximum" => node.maximum = Some(n),
                    "exclusiveMinimum" => node.exclusive_minimum = Some(n),
                    "exclusiveMaximum" => node.exclusive_maximum = Some(n),
                    _ => {
                        if n <= 0.0 {
                            return Err(ctx.invalid(tag, raw, "must be greater than zero"));
                        }
                        node.multiple_of = Some(n);
                    }
                }
            }
            "minLength" | "maxLength" => {
                ctx.require_kind(tag, kind, &[Kind::String])?;
                let n = ctx.count_tag(tag, raw)?;
                if tag == "minLength" {
                    node.min_length = Some(n);
                } else {
                    node.max_length = Some(n);
                }
            }
            "pattern" => {
                ctx.require_kind(tag, kind, &[Kind::String])?;
                let pattern = Pattern::new(raw).map_err(|e| ctx.invalid(tag, raw, e.to_string()))?;
                node.pattern = Some(pattern);
            }
            "patternDescription" => {
                ctx.require_kind(tag, kind, &[Kind::String])?;
                node.pattern_description = Some(raw.clone());
            }
            "minItems" | "maxItems" => {
                ctx.require_kind(tag, kind, &[Kind::Array])?;
                let n = ctx.count_tag(tag, raw)?;
                if tag == "minItems" {
                    node.min_items = Some(n);
                } else {
                    node.max_items = Some(n);
                }
            }
            "uniqueItems" => {
                ctx.require_kind(tag, kind, &[Kind::Array])?;
                node.unique_items = ctx.bool_tag(tag, raw)?;
            }
            "minProperties" | "maxProperties" => {
                ctx.require_kind(tag, kind, &[Kind::Object])?;
                let n = ctx.count_tag(tag, raw)?;
                if tag == "minProperties" {
                    node.min_properties = Some(n);
                } else {
                    node.max_properties = Some(n);
                }
            }
            "readOnly" => node.read_only = ctx.bool_tag(tag, raw)?,
            "writeOnly" => node.write_only = ctx.bool_tag(tag, raw)?,
            "deprecated" => node.deprecated = ctx.bool_tag(tag, raw)?,
            "hidden" => node.hidden = ctx.bool_tag(tag, raw)?,
            _ => {
                tracing::trace!(shape = ctx.shape, field = ctx.field, tag, "ignoring unrecognized tag");
            }
        }
    }

    if node.read_only && node.write_only {
        return Err(ctx.conflict("a field cannot be both readOnly and writeOnly"));
    }
    check_bounds(ctx, "minimum", node.minimum, "maximum", node.maximum)?;
    let (xmin, xmax) = (node.exclusive_minimum, node.exclusive_maximum);
    check_exclusive_bounds(ctx, "exclusiveMinimum", xmin, "exclusiveMaximum", xmax)?;
    check_exclusive_bounds(ctx, "minimum", node.minimum, "exclusiveMaximum", xmax)?;
    check_exclusive_bounds(ctx, "exclusiveMinimum", xmin, "maximum", node.maximum)?;
    let count = |n: Option<usize>| n.map(|n| n as f64);
    check_bounds(ctx, "minLength", count(node.min_length), "maxLength", count(node.max_length))?;
    check_bounds(ctx, "minItems", count(node.min_items), "maxItems", count(node.max_items))?;
    check_bounds(
        ctx,
        "minProperties",
        count(node.min_properties),
        "maxProperties",
        count(node.max_properties),
    )?;
    Ok(())
}

fn check_bounds(
    ctx: &FieldContext<'_>,
    low_tag: &str,
    low: Option<f64>,
    high_tag: &str,
    high: Option<f64>,
) -> Result<(), ConfigurationError> {
    match (low, high) {
        (Some(low), Some(high)) if low > high => Err(ctx.conflict(format!(
            "{low_tag} ({low}) is greater than {high_tag} ({high})"
        ))),
        _ => Ok(()),
    }
}

/// Like [`check_bounds`], but an exclusive bound on either side makes equal
/// limits unsatisfiable too.
fn check_exclusive_bounds(
    ctx: &FieldContext<'_>,
    low_tag: &str,
    low: Option<f64>,
    high_tag: &str,
    high: Option<f64>,
) -> Result<(), ConfigurationError> {
    match (low, high) {
        (Some(low), Some(high)) if low >= high => Err(ctx.conflict(format!(
            "{low_tag} ({low}) leaves no value below {high_tag} ({high})"
        ))),
        _ => Ok(()),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret a tag value as a value of `kind`. Strings are taken verbatim;
/// arrays and objects are parsed as JSON.
fn parse_scalar(kind: Kind, raw: &str) -> Result<Value, String> {
    match kind {
        Kind::String => Ok(Value::String(raw.to_string())),
        Kind::Boolean => raw
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| "expected true or false".to_string()),
        Kind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "expected an integer".to_string()),
        Kind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| "expected a finite number".to_string()),
        Kind::Array | Kind::Object => {
            let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
            if Kind::of(&value) == kind {
                Ok(value)
            } else {
                Err(format!("expected a JSON {kind}"))
            }
        }
        Kind::Null => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn describe(fields: Vec<FieldDescriptor>) -> ShapeDescriptor {
        fields
            .into_iter()
            .fold(ShapeDescriptor::new("Test"), ShapeDescriptor::field)
    }

    fn build(fields: Vec<FieldDescriptor>) -> SchemaNode {
        infer_shape(&describe(fields)).unwrap()
    }

    fn build_err(fields: Vec<FieldDescriptor>) -> ConfigurationError {
        infer_shape(&describe(fields)).unwrap_err()
    }

    struct Address;

    impl Shape for Address {
        fn describe() -> ShapeDescriptor {
            ShapeDescriptor::new("Address")
                .nullable(true)
                .field(FieldDescriptor::new("street", FieldType::String))
        }
    }

    struct Tree;

    impl Shape for Tree {
        fn describe() -> ShapeDescriptor {
            ShapeDescriptor::new("Tree")
                .field(FieldDescriptor::new("children", FieldType::array(FieldType::object::<Tree>())))
        }
    }

    #[test]
    fn test_fields_required_by_default() {
        let node = build(vec![FieldDescriptor::new("name", FieldType::String)]);
        assert_eq!(node.required, vec!["name"]);
        assert_eq!(node.additional_properties, AdditionalProperties::Deny);
    }

    #[test]
    fn test_required_resolution_chain() {
        let node = build(vec![
            FieldDescriptor::new("a", FieldType::String).omit_empty(),
            FieldDescriptor::new("b", FieldType::String).tag("required", "false"),
            FieldDescriptor::new("c", FieldType::String).omit_empty().tag("required", "true"),
            FieldDescriptor::new("d", FieldType::String),
        ]);
        assert_eq!(node.required, vec!["c", "d"]);
        assert_eq!(node.properties.len(), 4);
    }

    #[test]
    fn test_fields_optional_by_default_config() {
        let config = InferenceConfig {
            fields_optional_by_default: true,
        };
        let desc = describe(vec![
            FieldDescriptor::new("a", FieldType::String),
            FieldDescriptor::new("b", FieldType::String).tag("required", "true"),
        ]);
        let node = infer_shape_with(&desc, &config).unwrap();
        assert_eq!(node.required, vec!["b"]);
    }

    #[test]
    fn test_rename_and_ignore() {
        let node = build(vec![
            FieldDescriptor::new("credit_card", FieldType::String).rename("creditCard"),
            FieldDescriptor::new("internal", FieldType::String).ignored(),
        ]);
        assert!(node.property("creditCard").is_some());
        assert!(node.property("credit_card").is_none());
        assert!(node.property("internal").is_none());
        assert_eq!(node.required, vec!["creditCard"]);
    }

    #[test]
    fn test_optional_scalar_is_nullable() {
        let node = build(vec![
            FieldDescriptor::new("a", FieldType::optional(FieldType::Integer)),
            FieldDescriptor::new("b", FieldType::optional(FieldType::Integer)).omit_empty(),
            FieldDescriptor::new("c", FieldType::optional(FieldType::Integer)).tag("nullable", "false"),
            FieldDescriptor::new("d", FieldType::String).tag("nullable", "true"),
        ]);
        assert!(node.property("a").unwrap().nullable);
        assert!(!node.property("b").unwrap().nullable);
        assert!(!node.property("c").unwrap().nullable);
        assert!(node.property("d").unwrap().nullable);
    }

    #[test]
    fn test_optional_container_never_auto_nullable() {
        let node = build(vec![
            FieldDescriptor::new("tags", FieldType::optional(FieldType::array(FieldType::String))),
        ]);
        assert!(!node.property("tags").unwrap().nullable);
    }

    #[test]
    fn test_nullable_on_container_is_configuration_error() {
        let err = build_err(vec![
            FieldDescriptor::new("tags", FieldType::array(FieldType::String)).tag("nullable", "true"),
        ]);
        assert!(matches!(err, ConfigurationError::UnsupportedNullable { ref kind, .. } if kind == "array"));
    }

    #[test]
    fn test_container_nullable_comes_from_nested_shape() {
        let node = build(vec![FieldDescriptor::new("address", FieldType::object::<Address>())]);
        let address = node.property("address").unwrap();
        assert!(address.nullable);
        assert_eq!(address.kind, Some(Kind::Object));
        assert!(address.property("street").is_some());
    }

    #[test]
    fn test_container_additional_properties() {
        let desc = ShapeDescriptor::new("Open")
            .additional_properties(true)
            .field(FieldDescriptor::new("a", FieldType::String));
        let node = infer_shape(&desc).unwrap();
        assert_eq!(node.additional_properties, AdditionalProperties::Allow);
        assert_eq!(node.properties.len(), 1);
    }

    #[test]
    fn test_constraint_tags_map_onto_node() {
        let node = build(vec![
            FieldDescriptor::new("count", FieldType::Integer)
                .tag("minimum", "1")
                .tag("exclusiveMaximum", "100")
                .tag("multipleOf", "5")
                .tag("default", "10")
                .tag("doc", "How many")
                .tag("x-unknown", "whatever"),
            FieldDescriptor::new("code", FieldType::String)
                .tag("pattern", "^[A-Z]{3}$")
                .tag("patternDescription", "three capital letters")
                .tag("minLength", "3")
                .tag("maxLength", "3")
                .tag("format", "currency")
                .tag("enum", "USD, EUR,GBP"),
            FieldDescriptor::new("items", FieldType::array(FieldType::String))
                .tag("minItems", "1")
                .tag("uniqueItems", "true")
                .tag("enum", "a,b"),
        ]);
        let count = node.property("count").unwrap();
        assert_eq!(count.minimum, Some(1.0));
        assert_eq!(count.exclusive_maximum, Some(100.0));
        assert_eq!(count.multiple_of, Some(5.0));
        assert_eq!(count.default_value, Some(json!(10)));
        assert_eq!(count.description.as_deref(), Some("How many"));

        let code = node.property("code").unwrap();
        assert_eq!(code.pattern.as_ref().map(Pattern::as_str), Some("^[A-Z]{3}$"));
        assert_eq!(code.enum_values, vec![json!("USD"), json!("EUR"), json!("GBP")]);
        assert_eq!(code.format.as_deref(), Some("currency"));

        let items = node.property("items").unwrap();
        assert_eq!(items.min_items, Some(1));
        assert!(items.unique_items);
        assert!(items.enum_values.is_empty());
        assert_eq!(items.items.as_ref().unwrap().enum_values, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_dependent_required_recorded_on_container() {
        let node = build(vec![
            FieldDescriptor::new("creditCard", FieldType::String)
                .omit_empty()
                .tag("dependentRequired", "billingAddress"),
            FieldDescriptor::new("billingAddress", FieldType::String).omit_empty(),
        ]);
        assert_eq!(
            node.dependent_required,
            vec![("creditCard".to_string(), vec!["billingAddress".to_string()])]
        );
    }

    #[test]
    fn test_dependent_required_unknown_field() {
        let err = build_err(vec![
            FieldDescriptor::new("creditCard", FieldType::String).tag("dependentRequired", "nope"),
        ]);
        assert!(err.to_string().contains("unknown field 'nope'"));
    }

    #[test]
    fn test_invalid_tag_values() {
        let err = build_err(vec![FieldDescriptor::new("n", FieldType::Integer).tag("minimum", "one")]);
        assert!(matches!(err, ConfigurationError::InvalidTag { ref tag, .. } if tag == "minimum"));

        let err = build_err(vec![FieldDescriptor::new("s", FieldType::String).tag("pattern", "(")]);
        assert!(matches!(err, ConfigurationError::InvalidTag { ref tag, .. } if tag == "pattern"));

        let err = build_err(vec![FieldDescriptor::new("s", FieldType::String).tag("required", "yes")]);
        assert!(matches!(err, ConfigurationError::InvalidTag { ref tag, .. } if tag == "required"));
    }

    #[test]
    fn test_constraint_on_wrong_kind() {
        let err = build_err(vec![FieldDescriptor::new("n", FieldType::Integer).tag("minLength", "1")]);
        assert!(err.to_string().contains("applies to string fields, not integer"));
    }

    #[test]
    fn test_contradictory_declarations() {
        let err = build_err(vec![
            FieldDescriptor::new("a", FieldType::Integer).tag("minimum", "10").tag("maximum", "1"),
        ]);
        assert!(err.to_string().contains("greater than maximum"));

        let err = build_err(vec![FieldDescriptor::new("a", FieldType::Number)
            .tag("exclusiveMinimum", "5")
            .tag("exclusiveMaximum", "5")]);
        assert!(matches!(err, ConfigurationError::Conflict { .. }));
        assert!(err.to_string().contains("exclusiveMinimum (5) leaves no value below exclusiveMaximum (5)"));

        let err = build_err(vec![FieldDescriptor::new("a", FieldType::Integer)
            .tag("minimum", "10")
            .tag("exclusiveMaximum", "10")]);
        assert!(matches!(err, ConfigurationError::Conflict { .. }));

        let err = build_err(vec![FieldDescriptor::new("a", FieldType::Number)
            .tag("exclusiveMinimum", "3")
            .tag("maximum", "1")]);
        assert!(matches!(err, ConfigurationError::Conflict { .. }));

        let err = build_err(vec![
            FieldDescriptor::new("a", FieldType::String).tag("readOnly", "true").tag("writeOnly", "true"),
        ]);
        assert!(err.to_string().contains("both readOnly and writeOnly"));

        let err = build_err(vec![
            FieldDescriptor::new("a", FieldType::String),
            FieldDescriptor::new("b", FieldType::String).rename("a"),
        ]);
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_default_must_satisfy_constraints() {
        let err = build_err(vec![
            FieldDescriptor::new("n", FieldType::Integer).tag("minimum", "5").tag("default", "1"),
        ]);
        assert!(err.to_string().contains("default value"));
    }

    #[test]
    fn test_recursive_shape_rejected() {
        let err = SchemaRegistry::new().infer::<Tree>().unwrap_err();
        assert!(matches!(err, ConfigurationError::RecursiveShape { .. }));
        assert!(err.to_string().contains("Tree -> Tree"));
    }

    #[test]
    fn test_registry_memoizes() {
        let registry = SchemaRegistry::new();
        let a = registry.infer::<Address>().unwrap();
        let b = registry.infer::<Address>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.builds(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_caches_failures() {
        let registry = SchemaRegistry::new();
        let first = registry.infer::<Tree>().unwrap_err();
        let second = registry.infer::<Tree>().unwrap_err();
        assert_eq!(first, second);
        assert_eq!(registry.builds(), 1);
    }

    #[test]
    fn test_array_of_optional_scalars_has_nullable_items() {
        let node = build(vec![FieldDescriptor::new(
            "scores",
            FieldType::array(FieldType::optional(FieldType::Number)),
        )]);
        let scores = node.property("scores").unwrap();
        assert!(!scores.nullable);
        assert!(scores.items.as_ref().unwrap().nullable);
    }
}
