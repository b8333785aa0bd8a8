//! Loading hand-authored JSON Schema documents into [`SchemaNode`] trees.
//!
//! Supports the keyword subset the validator evaluates plus `not`, `allOf`,
//! `anyOf` and `oneOf`. Unknown keywords are ignored. Keyword errors carry a
//! JSON-pointer-like path (`#/properties/name/minLength`).

use covenant_core::ConfigurationError;
use serde_json::{Map, Value};

use crate::model::{AdditionalProperties, Combinator, Kind, Pattern, SchemaNode};

impl SchemaNode {
    /// Parse a JSON Schema document.
    ///
    /// Objects declaring `"type": "object"` reject undeclared keys unless
    /// `additionalProperties` says otherwise. Nodes that do not declare the
    /// object type (combinator branches, bare `required` lists) accept them.
    pub fn from_value(doc: &Value) -> Result<SchemaNode, ConfigurationError> {
        parse(doc, "#")
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSchema {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn parse(doc: &Value, path: &str) -> Result<SchemaNode, ConfigurationError> {
    let obj = match doc {
        Value::Object(obj) => obj,
        Value::Bool(true) => {
            return Ok(SchemaNode {
                additional_properties: AdditionalProperties::Allow,
                ..SchemaNode::default()
            })
        }
        Value::Bool(false) => {
            return Ok(SchemaNode {
                combinator: Some(Combinator::Not(Box::new(SchemaNode {
                    additional_properties: AdditionalProperties::Allow,
                    ..SchemaNode::default()
                }))),
                ..SchemaNode::default()
            })
        }
        _ => return Err(invalid(path, "expected a schema object")),
    };

    let mut node = SchemaNode::default();
    let mut explicit_additional = false;

    for (key, value) in obj {
        let at = format!("{path}/{key}");
        match key.as_str() {
            "type" => {
                let (kind, nullable) = parse_type(value, &at)?;
                node.kind = Some(kind);
                node.nullable |= nullable;
            }
            "nullable" => node.nullable |= boolean(value, &at)?,
            "description" => node.description = Some(string(value, &at)?),
            "format" => node.format = Some(string(value, &at)?),

            "properties" => {
                let props = object(value, &at)?;
                node.properties = props
                    .iter()
                    .map(|(name, schema)| Ok((name.clone(), parse(schema, &format!("{at}/{name}"))?)))
                    .collect::<Result<_, ConfigurationError>>()?;
            }
            "required" => node.required = strings(value, &at)?,
            "additionalProperties" => {
                explicit_additional = true;
                node.additional_properties = match value {
                    Value::Bool(false) => AdditionalProperties::Deny,
                    Value::Bool(true) => AdditionalProperties::Allow,
                    schema => AdditionalProperties::Schema(Box::new(parse(schema, &at)?)),
                };
            }
            "minProperties" => node.min_properties = Some(count(value, &at)?),
            "maxProperties" => node.max_properties = Some(count(value, &at)?),
            "dependentRequired" => {
                node.dependent_required = object(value, &at)?
                    .iter()
                    .map(|(name, deps)| Ok((name.clone(), strings(deps, &format!("{at}/{name}"))?)))
                    .collect::<Result<_, ConfigurationError>>()?;
            }

            "items" => node.items = Some(Box::new(parse(value, &at)?)),
            "minItems" => node.min_items = Some(count(value, &at)?),
            "maxItems" => node.max_items = Some(count(value, &at)?),
            "uniqueItems" => node.unique_items = boolean(value, &at)?,

            "minimum" => node.minimum = Some(number(value, &at)?),
            "maximum" => node.maximum = Some(number(value, &at)?),
            "exclusiveMinimum" => node.exclusive_minimum = Some(number(value, &at)?),
            "exclusiveMaximum" => node.exclusive_maximum = Some(number(value, &at)?),
            "multipleOf" => {
                let m = number(value, &at)?;
                if m <= 0.0 {
                    return Err(invalid(&at, "must be greater than zero"));
                }
                node.multiple_of = Some(m);
            }

            "minLength" => node.min_length = Some(count(value, &at)?),
            "maxLength" => node.max_length = Some(count(value, &at)?),
            "pattern" => {
                let source = string(value, &at)?;
                let pattern = Pattern::new(&source).map_err(|e| invalid(&at, e.to_string()))?;
                node.pattern = Some(pattern);
            }
            "patternDescription" => node.pattern_description = Some(string(value, &at)?),

            "enum" => {
                let values = value.as_array().ok_or_else(|| invalid(&at, "expected an array"))?;
                if values.is_empty() {
                    return Err(invalid(&at, "must list at least one value"));
                }
                node.enum_values = values.clone();
            }
            "default" => node.default_value = Some(value.clone()),
            "examples" => {
                let values = value.as_array().ok_or_else(|| invalid(&at, "expected an array"))?;
                node.examples.extend(values.iter().cloned());
            }
            "example" => node.examples.push(value.clone()),
            "deprecated" => node.deprecated = boolean(value, &at)?,
            "readOnly" => node.read_only = boolean(value, &at)?,
            "writeOnly" => node.write_only = boolean(value, &at)?,

            "not" => set_combinator(&mut node, &at, Combinator::Not(Box::new(parse(value, &at)?)))?,
            "allOf" => set_combinator(&mut node, &at, Combinator::AllOf(branches(value, &at)?))?,
            "anyOf" => set_combinator(&mut node, &at, Combinator::AnyOf(branches(value, &at)?))?,
            "oneOf" => set_combinator(&mut node, &at, Combinator::OneOf(branches(value, &at)?))?,

            _ => tracing::trace!(keyword = %key, path, "ignoring unsupported keyword"),
        }
    }

    if node.nullable && matches!(node.kind, Some(Kind::Array | Kind::Object)) {
        return Err(invalid(
            &format!("{path}/type"),
            "nullable arrays and objects are not supported; use oneOf with a null branch",
        ));
    }
    if !explicit_additional && node.kind != Some(Kind::Object) {
        node.additional_properties = AdditionalProperties::Allow;
    }
    if node.read_only && node.write_only {
        return Err(invalid(path, "readOnly and writeOnly are mutually exclusive"));
    }

    Ok(node)
}

/// `"string"`, or `["string", "null"]`.
fn parse_type(value: &Value, at: &str) -> Result<(Kind, bool), ConfigurationError> {
    let names: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(_) => strings(value, at)?,
        _ => return Err(invalid(at, "expected a string or an array of strings")),
    };
    let nullable = names.iter().any(|n| n == "null");
    let mut kinds = names.iter().filter(|n| *n != "null");
    let kind = match (kinds.next(), kinds.next()) {
        (None, _) if nullable => return Ok((Kind::Null, false)),
        (None, _) => return Err(invalid(at, "must name at least one type")),
        (Some(name), None) => name,
        (Some(_), Some(_)) => {
            return Err(invalid(at, "type unions are not supported; use anyOf"));
        }
    };
    let kind = Kind::parse(kind).ok_or_else(|| invalid(at, format!("unknown type '{kind}'")))?;
    Ok((kind, nullable))
}

fn set_combinator(node: &mut SchemaNode, at: &str, combinator: Combinator) -> Result<(), ConfigurationError> {
    if node.combinator.is_some() {
        return Err(invalid(at, "only one of not, allOf, anyOf, oneOf may appear in a schema"));
    }
    node.combinator = Some(combinator);
    Ok(())
}

fn branches(value: &Value, at: &str) -> Result<Vec<SchemaNode>, ConfigurationError> {
    let list = value.as_array().ok_or_else(|| invalid(at, "expected an array of schemas"))?;
    if list.is_empty() {
        return Err(invalid(at, "must contain at least one schema"));
    }
    list.iter()
        .enumerate()
        .map(|(i, branch)| parse(branch, &format!("{at}/{i}")))
        .collect()
}

fn object<'v>(value: &'v Value, at: &str) -> Result<&'v Map<String, Value>, ConfigurationError> {
    value.as_object().ok_or_else(|| invalid(at, "expected an object"))
}

fn string(value: &Value, at: &str) -> Result<String, ConfigurationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(at, "expected a string"))
}

fn strings(value: &Value, at: &str) -> Result<Vec<String>, ConfigurationError> {
    value
        .as_array()
        .ok_or_else(|| invalid(at, "expected an array of strings"))?
        .iter()
        .map(|v| string(v, at))
        .collect()
}

fn boolean(value: &Value, at: &str) -> Result<bool, ConfigurationError> {
    value.as_bool().ok_or_else(|| invalid(at, "expected a boolean"))
}

fn number(value: &Value, at: &str) -> Result<f64, ConfigurationError> {
    value.as_f64().ok_or_else(|| invalid(at, "expected a number"))
}

fn count(value: &Value, at: &str) -> Result<usize, ConfigurationError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(at, "expected a non-negative integer"))
}
