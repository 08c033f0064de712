//! # Schema Document Parsing
//!
//! Fetched schema text is parsed as YAML when the `yaml` feature is enabled.
//! YAML is a superset of JSON, so plain JSON schemas parse the same way.
//! Without the feature, parsing falls back to strict JSON.

use serde_json::Value;

/// Parse failure for fetched schema text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The YAML document uses constructs with no JSON equivalent.
    #[error("YAML-to-JSON conversion failed: {0}")]
    Conversion(String),
}

/// Parse raw schema text into a document.
#[cfg(feature = "yaml")]
pub fn parse_document(raw: &str) -> Result<Value, ParseError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)?;
    yaml_to_json_value(&yaml).map_err(ParseError::Conversion)
}

/// Parse raw schema text into a document.
#[cfg(not(feature = "yaml"))]
pub fn parse_document(raw: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(raw)?)
}

/// Convert a `serde_yaml::Value` into the equivalent `serde_json::Value`.
///
/// Scalar map keys are stringified; tags are dropped in favor of the
/// tagged value.
#[cfg(feature = "yaml")]
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
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
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
