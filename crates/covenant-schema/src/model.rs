//! # Schema Model
//!
//! The immutable in-memory schema tree. A [`SchemaNode`] is produced either
//! by inference from a shape description ([`crate::infer`]) or by loading a
//! hand-authored JSON Schema document ([`crate::authored`]). Once built, a
//! tree is wrapped in an `Arc` and never mutated; any number of concurrent
//! validations may share it.
//!
//! ## Invariants
//!
//! - Every property name appears in `properties` exactly once, and is either
//!   listed in `required` or not. There is no third state.
//! - `nullable` is only set on scalar kinds, or on an object through
//!   container-level configuration. Never on arrays.
//! - `additional_properties` defaults to [`AdditionalProperties::Deny`].
//! - `properties` preserves declaration order.
//! - `combinator` is only populated by hand-authored schemas.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The structural kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// The `null` value.
    Null,
    /// `true` or `false`.
    Boolean,
    /// A number without a fractional part.
    Integer,
    /// Any number.
    Number,
    /// A Unicode string.
    String,
    /// An ordered sequence.
    Array,
    /// A string-keyed mapping.
    Object,
}

impl Kind {
    /// The JSON Schema `type` keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }

    /// Parse a JSON Schema `type` keyword.
    pub fn parse(s: &str) -> Option<Kind> {
        Some(match s {
            "null" => Kind::Null,
            "boolean" => Kind::Boolean,
            "integer" => Kind::Integer,
            "number" => Kind::Number,
            "string" => Kind::String,
            "array" => Kind::Array,
            "object" => Kind::Object,
            _ => return None,
        })
    }

    /// Whether fields of this kind may carry `nullable`.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Kind::Boolean | Kind::Integer | Kind::Number | Kind::String
        )
    }

    /// Whether numeric constraints apply to this kind.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Kind::Integer | Kind::Number)
    }

    /// The runtime kind of a decoded value. Integral numbers report
    /// [`Kind::Integer`].
    pub fn of(value: &Value) -> Kind {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(n) => {
                if is_integral(n) {
                    Kind::Integer
                } else {
                    Kind::Number
                }
            }
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Whether a value of this runtime kind satisfies a schema of kind `self`.
    /// Integers satisfy `number`.
    pub fn accepts(&self, value: &Value) -> bool {
        let actual = Kind::of(value);
        actual == *self || (*self == Kind::Number && actual == Kind::Integer)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a JSON number has no fractional part.
pub(crate) fn is_integral(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// A regular expression compiled once when the schema is built.
///
/// Equality compares the source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test a string value. Unanchored, as in JSON Schema; authors anchor
    /// with `^` and `$`.
    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Policy for object keys absent from `properties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    /// Unknown keys are rejected.
    #[default]
    Deny,
    /// Unknown keys are accepted without inspection.
    Allow,
    /// Unknown keys are accepted if their values match the schema.
    Schema(Box<SchemaNode>),
}

/// Schema combinators. Only hand-authored schemas carry these.
#[derive(Debug, Clone, PartialEq)]
pub enum Combinator {
    /// The value must not match the inner schema.
    Not(Box<SchemaNode>),
    /// The value must match every branch.
    AllOf(Vec<SchemaNode>),
    /// The value must match at least one branch.
    AnyOf(Vec<SchemaNode>),
    /// The value must match exactly one branch.
    OneOf(Vec<SchemaNode>),
}

/// One node of a schema tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// Expected kind. `None` accepts any kind (combinator-only nodes).
    pub kind: Option<Kind>,
    /// Whether `null` is accepted in addition to `kind`.
    pub nullable: bool,
    /// Documentation for the node.
    pub description: Option<String>,
    /// Key into the format registry.
    pub format: Option<String>,

    /// Names of properties that must be present, in declaration order.
    pub required: Vec<String>,
    /// Declared properties, in declaration order.
    pub properties: Vec<(String, SchemaNode)>,
    /// Policy for undeclared keys.
    pub additional_properties: AdditionalProperties,
    /// Minimum number of keys.
    pub min_properties: Option<usize>,
    /// Maximum number of keys.
    pub max_properties: Option<usize>,
    /// When the key is present, every listed name must also be present.
    pub dependent_required: Vec<(String, Vec<String>)>,

    /// Element schema.
    pub items: Option<Box<SchemaNode>>,
    /// Minimum number of elements.
    pub min_items: Option<usize>,
    /// Maximum number of elements.
    pub max_items: Option<usize>,
    /// Whether elements must be pairwise distinct.
    pub unique_items: bool,

    /// Inclusive lower bound.
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    pub maximum: Option<f64>,
    /// Strict lower bound.
    pub exclusive_minimum: Option<f64>,
    /// Strict upper bound.
    pub exclusive_maximum: Option<f64>,
    /// The value must be an integer multiple of this.
    pub multiple_of: Option<f64>,

    /// Minimum length in Unicode scalar values.
    pub min_length: Option<usize>,
    /// Maximum length in Unicode scalar values.
    pub max_length: Option<usize>,
    /// Precompiled pattern.
    pub pattern: Option<Pattern>,
    /// Human-readable description of `pattern`, used in error messages.
    pub pattern_description: Option<String>,

    /// Allowed values. Empty means unrestricted.
    pub enum_values: Vec<Value>,
    /// Documented default.
    pub default_value: Option<Value>,
    /// Documented examples.
    pub examples: Vec<Value>,
    /// Documentation-only flag.
    pub deprecated: bool,
    /// Sent by the server only; not required in requests.
    pub read_only: bool,
    /// Sent by the client only; not required in responses.
    pub write_only: bool,
    /// Excluded from rendered documentation; still validated.
    pub hidden: bool,

    /// Combinator for hand-authored schemas.
    pub combinator: Option<Combinator>,
}

impl SchemaNode {
    /// A node of the given kind with no constraints.
    pub fn of_kind(kind: Kind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Look up a declared property by external name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Whether `name` is listed as required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Render as a JSON Schema document.
    ///
    /// Nullable nodes render `type` as `[kind, "null"]`. Hidden properties
    /// are omitted from `properties` and `required`.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();

        if let Some(kind) = self.kind {
            if self.nullable {
                out.insert("type".into(), Value::from(vec![kind.as_str(), "null"]));
            } else {
                out.insert("type".into(), Value::from(kind.as_str()));
            }
        }
        if let Some(desc) = &self.description {
            out.insert("description".into(), Value::from(desc.as_str()));
        }
        if let Some(format) = &self.format {
            out.insert("format".into(), Value::from(format.as_str()));
        }

        insert_number(&mut out, "minimum", self.minimum);
        insert_number(&mut out, "exclusiveMinimum", self.exclusive_minimum);
        insert_number(&mut out, "maximum", self.maximum);
        insert_number(&mut out, "exclusiveMaximum", self.exclusive_maximum);
        insert_number(&mut out, "multipleOf", self.multiple_of);
        insert_count(&mut out, "minLength", self.min_length);
        insert_count(&mut out, "maxLength", self.max_length);
        if let Some(pattern) = &self.pattern {
            out.insert("pattern".into(), Value::from(pattern.as_str()));
        }
        if let Some(desc) = &self.pattern_description {
            out.insert("patternDescription".into(), Value::from(desc.as_str()));
        }

        if let Some(items) = &self.items {
            out.insert("items".into(), items.to_value());
        }
        insert_count(&mut out, "minItems", self.min_items);
        insert_count(&mut out, "maxItems", self.max_items);
        if self.unique_items {
            out.insert("uniqueItems".into(), Value::Bool(true));
        }

        if self.kind == Some(Kind::Object) || !self.properties.is_empty() {
            let mut props = Map::new();
            for (name, node) in &self.properties {
                if !node.hidden {
                    props.insert(name.clone(), node.to_value());
                }
            }
            out.insert("properties".into(), Value::Object(props));

            let required: Vec<Value> = self
                .required
                .iter()
                .filter(|name| self.property(name).map_or(true, |n| !n.hidden))
                .map(|name| Value::from(name.as_str()))
                .collect();
            if !required.is_empty() {
                out.insert("required".into(), Value::Array(required));
            }

            let additional = match &self.additional_properties {
                AdditionalProperties::Deny => Value::Bool(false),
                AdditionalProperties::Allow => Value::Bool(true),
                AdditionalProperties::Schema(node) => node.to_value(),
            };
            out.insert("additionalProperties".into(), additional);
        }
        insert_count(&mut out, "minProperties", self.min_properties);
        insert_count(&mut out, "maxProperties", self.max_properties);
        if !self.dependent_required.is_empty() {
            let deps: Map<String, Value> = self
                .dependent_required
                .iter()
                .map(|(k, names)| (k.clone(), Value::from(names.clone())))
                .collect();
            out.insert("dependentRequired".into(), Value::Object(deps));
        }

        if !self.enum_values.is_empty() {
            out.insert("enum".into(), Value::Array(self.enum_values.clone()));
        }
        if let Some(default) = &self.default_value {
            out.insert("default".into(), default.clone());
        }
        if !self.examples.is_empty() {
            out.insert("examples".into(), Value::Array(self.examples.clone()));
        }
        for (key, flag) in [
            ("deprecated", self.deprecated),
            ("readOnly", self.read_only),
            ("writeOnly", self.write_only),
        ] {
            if flag {
                out.insert(key.into(), Value::Bool(true));
            }
        }

        match &self.combinator {
            Some(Combinator::Not(inner)) => {
                out.insert("not".into(), inner.to_value());
            }
            Some(Combinator::AllOf(branches)) => {
                out.insert("allOf".into(), branches_value(branches));
            }
            Some(Combinator::AnyOf(branches)) => {
                out.insert("anyOf".into(), branches_value(branches));
            }
            Some(Combinator::OneOf(branches)) => {
                out.insert("oneOf".into(), branches_value(branches));
            }
            None => {}
        }

        Value::Object(out)
    }
}

fn insert_number(out: &mut Map<String, Value>, key: &str, n: Option<f64>) {
    if let Some(n) = n {
        let value = if n.fract() == 0.0 && n.abs() < 9.0e15 {
            Value::from(n as i64)
        } else {
            Value::from(n)
        };
        out.insert(key.into(), value);
    }
}

fn insert_count(out: &mut Map<String, Value>, key: &str, n: Option<usize>) {
    if let Some(n) = n {
        out.insert(key.into(), Value::from(n));
    }
}

fn branches_value(branches: &[SchemaNode]) -> Value {
    Value::Array(branches.iter().map(SchemaNode::to_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_integral_float() {
        assert_eq!(Kind::of(&json!(3)), Kind::Integer);
        assert_eq!(Kind::of(&json!(3.0)), Kind::Integer);
        assert_eq!(Kind::of(&json!(3.5)), Kind::Number);
    }

    #[test]
    fn test_number_accepts_integer() {
        assert!(Kind::Number.accepts(&json!(1)));
        assert!(!Kind::Integer.accepts(&json!(1.5)));
        assert!(!Kind::String.accepts(&json!(null)));
    }

    #[test]
    fn test_pattern_equality_by_source() {
        let a = Pattern::new("^[a-z]+$").unwrap();
        let b = Pattern::new("^[a-z]+$").unwrap();
        assert_eq!(a, b);
        assert!(a.is_match("abc"));
        assert!(!a.is_match("ABC"));
    }

    #[test]
    fn test_nullable_renders_type_union() {
        let node = SchemaNode {
            nullable: true,
            ..SchemaNode::of_kind(Kind::String)
        };
        assert_eq!(node.to_value()["type"], json!(["string", "null"]));
    }

    #[test]
    fn test_object_renders_strict_by_default() {
        let node = SchemaNode {
            properties: vec![
                ("name".into(), SchemaNode::of_kind(Kind::String)),
                (
                    "secret".into(),
                    SchemaNode {
                        hidden: true,
                        ..SchemaNode::of_kind(Kind::String)
                    },
                ),
            ],
            required: vec!["name".into(), "secret".into()],
            ..SchemaNode::of_kind(Kind::Object)
        };
        let v = node.to_value();
        assert_eq!(v["additionalProperties"], json!(false));
        assert_eq!(v["required"], json!(["name"]));
        assert!(v["properties"].get("secret").is_none());
    }

    #[test]
    fn test_integral_bounds_render_as_integers() {
        let node = SchemaNode {
            minimum: Some(1.0),
            multiple_of: Some(0.5),
            ..SchemaNode::of_kind(Kind::Number)
        };
        let v = node.to_value();
        assert_eq!(v["minimum"], json!(1));
        assert_eq!(v["multipleOf"], json!(0.5));
    }
}
