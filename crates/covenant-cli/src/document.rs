//! # Document Loading
//!
//! Reads JSON or YAML files into `serde_json::Value` trees. The format is
//! chosen by extension: `.yaml` and `.yml` are YAML, everything else JSON.

use std::path::Path;

use covenant_core::CovenantError;
use covenant_schema::SchemaNode;
use serde_json::Value;

/// Load a JSON or YAML document.
pub fn load(path: &Path) -> Result<Value, CovenantError> {
    let text = std::fs::read_to_string(path)?;
    let source_name = path.display().to_string();
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| CovenantError::Parse {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        yaml_to_json_value(&yaml).map_err(|reason| CovenantError::Parse { source_name, reason })
    } else {
        serde_json::from_str(&text).map_err(|e| CovenantError::Parse {
            source_name,
            reason: e.to_string(),
        })
    }
}

/// Load and parse a hand-authored JSON Schema.
pub fn load_schema(path: &Path) -> Result<SchemaNode, CovenantError> {
    let doc = load(path)?;
    let schema = SchemaNode::from_value(&doc)?;
    tracing::debug!(path = %path.display(), "loaded schema");
    Ok(schema)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Scalar map keys are stringified. YAML tags are dropped.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_preserves_key_order() {
        let file = write_temp(".yaml", "b: 1\na:\n  - x\n  - 2.5\nc: null\n");
        let value = load(file.path()).unwrap();
        assert_eq!(value, json!({"b": 1, "a": ["x", 2.5], "c": null}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(".json", r#"{"name": "Ada"}"#);
        assert_eq!(load(file.path()).unwrap(), json!({"name": "Ada"}));
    }

    #[test]
    fn test_parse_error_names_source() {
        let file = write_temp(".json", "{not json");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, CovenantError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_schema_reports_configuration_error() {
        let file = write_temp(".json", r#"{"type": "object", "properties": {"a": {"minLength": "x"}}}"#);
        let err = load_schema(file.path()).unwrap_err();
        assert!(matches!(err, CovenantError::Configuration(_)));
        assert!(err.to_string().contains("#/properties/a/minLength"));
    }

    #[test]
    fn test_numeric_yaml_keys_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        assert_eq!(yaml_to_json_value(&yaml).unwrap(), json!({"1": "one", "true": "yes"}));
    }
}
