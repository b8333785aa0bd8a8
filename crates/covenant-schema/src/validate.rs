//! # Validation
//!
//! Walks a decoded `serde_json::Value` against a [`SchemaNode`] and returns
//! every independent violation as a located [`ErrorDetail`].
//!
//! ## Exhaustiveness
//!
//! A kind mismatch records exactly one error for the node and does not
//! descend: its children have no well-defined shape to check. Every other
//! check runs to completion, sibling by sibling, so a single call surfaces
//! all violations. An empty result is the only success signal.
//!
//! ## `multipleOf` Tolerance
//!
//! Integral operands use exact remainder. Otherwise a value `v` is a
//! multiple of `m` when the quotient `q = v / m` satisfies
//! `|q - round(q)| <= 1e-9`. The tolerance is relative to `m`, so it absorbs
//! binary floating-point representation error (`0.3` is a multiple of `0.1`)
//! without growing with the magnitude of `v`.

use covenant_core::{ErrorDetail, Location};
use serde_json::{Map, Number, Value};

use crate::formats::{FormatCheck, FormatRegistry};
use crate::model::{AdditionalProperties, Combinator, SchemaNode};

/// Tolerance on the quotient `v / m` for floating-point `multipleOf` checks.
pub const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

/// Which side of an exchange a payload belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Client-to-server payloads. `readOnly` properties are not required.
    #[default]
    Request,
    /// Server-to-client payloads. `writeOnly` properties are not required.
    Response,
}

/// Validates values against schema trees.
///
/// Holds no mutable state; one validator may be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    formats: &'r FormatRegistry,
    mode: ValidationMode,
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self::new(FormatRegistry::builtin())
    }
}

impl<'r> Validator<'r> {
    /// A request-mode validator using `formats`.
    pub fn new(formats: &'r FormatRegistry) -> Self {
        Self {
            formats,
            mode: ValidationMode::default(),
        }
    }

    /// Set the validation mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate `value` against `schema`, rooting locations at `root`
    /// (e.g. `"request.body"`).
    pub fn validate(&self, schema: &SchemaNode, value: &Value, root: &str) -> Vec<ErrorDetail> {
        let errors = self.collect(schema, value, &Location::new(root));
        tracing::trace!(root, errors = errors.len(), "validated value");
        errors
    }

    fn collect(&self, schema: &SchemaNode, value: &Value, loc: &Location) -> Vec<ErrorDetail> {
        let mut errors = Vec::new();
        self.walk(schema, value, loc, &mut errors);
        errors
    }

    fn walk(&self, schema: &SchemaNode, value: &Value, loc: &Location, errors: &mut Vec<ErrorDetail>) {
        if value.is_null() && schema.nullable {
            return;
        }
        if let Some(kind) = schema.kind {
            if !kind.accepts(value) {
                let message = if schema.nullable {
                    format!("expected {kind} or null")
                } else {
                    format!("expected {kind}")
                };
                errors.push(loc.error(message).with_value(value.clone()));
                return;
            }
        }

        match value {
            Value::Number(n) => check_number(schema, n, value, loc, errors),
            Value::String(s) => self.check_string(schema, s, value, loc, errors),
            Value::Array(items) => self.check_array(schema, items, value, loc, errors),
            Value::Object(map) => self.check_object(schema, map, value, loc, errors),
            Value::Null | Value::Bool(_) => {}
        }

        if !schema.enum_values.is_empty() && !schema.enum_values.iter().any(|e| json_equal(e, value)) {
            let allowed: Vec<String> = schema.enum_values.iter().map(render).collect();
            errors.push(
                loc.error(format!("expected value to be one of \"{}\"", allowed.join(", ")))
                    .with_value(value.clone()),
            );
        }

        if let Some(combinator) = &schema.combinator {
            self.check_combinator(combinator, value, loc, errors);
        }
    }

    fn check_string(
        &self,
        schema: &SchemaNode,
        s: &str,
        value: &Value,
        loc: &Location,
        errors: &mut Vec<ErrorDetail>,
    ) {
        let len = s.chars().count();
        if let Some(min) = schema.min_length {
            if len < min {
                errors.push(loc.error(format!("expected length >= {min}")).with_value(value.clone()));
            }
        }
        if let Some(max) = schema.max_length {
            if len > max {
                errors.push(loc.error(format!("expected length <= {max}")).with_value(value.clone()));
            }
        }
        if let Some(pattern) = &schema.pattern {
            if !pattern.is_match(s) {
                let message = match &schema.pattern_description {
                    Some(desc) => format!("expected string to be {desc}"),
                    None => format!("expected string to match pattern {}", pattern.as_str()),
                };
                errors.push(loc.error(message).with_value(value.clone()));
            }
        }
        if let Some(format) = &schema.format {
            if self.formats.check(format, s) == FormatCheck::Invalid {
                errors.push(
                    loc.error(format!("expected string to be a valid {format}"))
                        .with_value(value.clone()),
                );
            }
        }
    }

    fn check_array(
        &self,
        schema: &SchemaNode,
        items: &[Value],
        value: &Value,
        loc: &Location,
        errors: &mut Vec<ErrorDetail>,
    ) {
        if let Some(min) = schema.min_items {
            if items.len() < min {
                errors.push(loc.error(format!("expected array length >= {min}")).with_value(value.clone()));
            }
        }
        if let Some(max) = schema.max_items {
            if items.len() > max {
                errors.push(loc.error(format!("expected array length <= {max}")).with_value(value.clone()));
            }
        }
        if schema.unique_items && has_duplicates(items) {
            errors.push(loc.error("expected array items to be unique").with_value(value.clone()));
        }
        if let Some(item_schema) = &schema.items {
            for (i, item) in items.iter().enumerate() {
                self.walk(item_schema, item, &loc.index(i), errors);
            }
        }
    }

    fn check_object(
        &self,
        schema: &SchemaNode,
        map: &Map<String, Value>,
        value: &Value,
        loc: &Location,
        errors: &mut Vec<ErrorDetail>,
    ) {
        if let Some(min) = schema.min_properties {
            if map.len() < min {
                errors.push(
                    loc.error(format!("expected object with at least {min} properties"))
                        .with_value(value.clone()),
                );
            }
        }
        if let Some(max) = schema.max_properties {
            if map.len() > max {
                errors.push(
                    loc.error(format!("expected object with at most {max} properties"))
                        .with_value(value.clone()),
                );
            }
        }

        for (name, property) in &schema.properties {
            if let Some(v) = map.get(name) {
                self.walk(property, v, &loc.field(name), errors);
            }
        }

        for name in &schema.required {
            if map.contains_key(name) || self.exempt(schema.property(name)) {
                continue;
            }
            errors.push(loc.field(name).error(format!("expected required property {name} to be present")));
        }

        for (key, v) in map {
            if schema.property(key).is_some() {
                continue;
            }
            match &schema.additional_properties {
                AdditionalProperties::Deny => {
                    errors.push(loc.field(key).error("unexpected property").with_value(v.clone()));
                }
                AdditionalProperties::Allow => {}
                AdditionalProperties::Schema(extra) => self.walk(extra, v, &loc.field(key), errors),
            }
        }

        for (name, deps) in &schema.dependent_required {
            if !map.contains_key(name) {
                continue;
            }
            for dep in deps.iter().filter(|d| !map.contains_key(d.as_str())) {
                errors.push(
                    loc.field(dep)
                        .error(format!("expected property {dep} to be present when {name} is present")),
                );
            }
        }
    }

    /// Whether a required property may be absent in the current mode.
    fn exempt(&self, property: Option<&SchemaNode>) -> bool {
        property.is_some_and(|p| match self.mode {
            ValidationMode::Request => p.read_only,
            ValidationMode::Response => p.write_only,
        })
    }

    fn check_combinator(
        &self,
        combinator: &Combinator,
        value: &Value,
        loc: &Location,
        errors: &mut Vec<ErrorDetail>,
    ) {
        match combinator {
            Combinator::Not(inner) => {
                if self.collect(inner, value, loc).is_empty() {
                    errors.push(loc.error("expected value to not match schema").with_value(value.clone()));
                }
            }
            Combinator::AllOf(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    let branch_errors = self.collect(branch, value, loc);
                    if let Some(first) = branch_errors.first() {
                        errors.push(
                            loc.error(format!("expected value to match allOf[{i}]: {first}"))
                                .with_value(value.clone()),
                        );
                    }
                }
            }
            Combinator::AnyOf(branches) => {
                if branches.iter().all(|b| !self.collect(b, value, loc).is_empty()) {
                    errors.push(
                        loc.error("expected value to match at least one schema but matched none")
                            .with_value(value.clone()),
                    );
                }
            }
            Combinator::OneOf(branches) => {
                let matched = branches
                    .iter()
                    .filter(|b| self.collect(b, value, loc).is_empty())
                    .count();
                if matched != 1 {
                    let found = if matched == 0 {
                        "none".to_string()
                    } else {
                        matched.to_string()
                    };
                    errors.push(
                        loc.error(format!("expected value to match exactly one schema but matched {found}"))
                            .with_value(value.clone()),
                    );
                }
            }
        }
    }
}

fn check_number(schema: &SchemaNode, n: &Number, value: &Value, loc: &Location, errors: &mut Vec<ErrorDetail>) {
    let Some(v) = n.as_f64() else {
        return;
    };
    let mut fail = |message: String| errors.push(loc.error(message).with_value(value.clone()));

    if let Some(min) = schema.minimum {
        if v < min {
            fail(format!("expected number >= {min}"));
        }
    }
    if let Some(min) = schema.exclusive_minimum {
        if v <= min {
            fail(format!("expected number > {min}"));
        }
    }
    if let Some(max) = schema.maximum {
        if v > max {
            fail(format!("expected number <= {max}"));
        }
    }
    if let Some(max) = schema.exclusive_maximum {
        if v >= max {
            fail(format!("expected number < {max}"));
        }
    }
    if let Some(m) = schema.multiple_of {
        if !is_multiple_of(n, m) {
            fail(format!("expected number to be a multiple of {m}"));
        }
    }
}

/// `multipleOf` with exact integer remainder where possible.
pub fn is_multiple_of(n: &Number, m: f64) -> bool {
    if m <= 0.0 || !m.is_finite() {
        return false;
    }
    if m.fract() == 0.0 && m <= i64::MAX as f64 {
        let divisor = m as i64;
        if let Some(i) = n.as_i64() {
            return i % divisor == 0;
        }
        if let Some(u) = n.as_u64() {
            return u % divisor as u64 == 0;
        }
    }
    let Some(v) = n.as_f64() else {
        return false;
    };
    let quotient = v / m;
    quotient.is_finite() && (quotient - quotient.round()).abs() <= MULTIPLE_OF_TOLERANCE
}

/// Deep structural equality. Numbers compare by value, so `1` equals `1.0`.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(i), Some(j)) => i == j,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].iter().any(|b| json_equal(a, b)))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
