//! Bounded one-level flattening of a JSON object into pattern-matchable
//! `key=value` text.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("line is not a JSON object")]
    NotAnObject,

    #[error("JSON parse failure: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flatten one JSONL record into space-joined `key=value` pairs.
///
/// Object values are descended exactly one level (`parent_child=value`);
/// anything deeper is rendered as compact JSON. Null values are skipped.
pub fn flatten_json(raw: &str) -> Result<String, FlattenError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = match value {
        Value::Object(map) => map,
        _ => return Err(FlattenError::NotAnObject),
    };

    let mut pairs: Vec<String> = Vec::with_capacity(object.len());
    for (key, value) in &object {
        match value {
            Value::Null => continue,
            Value::Object(inner) => {
                for (inner_key, inner_value) in inner {
                    if inner_value.is_null() {
                        continue;
                    }
                    pairs.push(format!("{key}_{inner_key}={}", render_scalar(inner_value)));
                }
            }
            other => pairs.push(format!("{key}={}", render_scalar(other))),
        }
    }

    Ok(pairs.join(" "))
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_scalars() {
        let text = flatten_json(r#"{"ok":false,"path":"/admin","status":404}"#).unwrap();
        assert_eq!(text, "ok=false path=/admin status=404");
    }

    #[test]
    fn flattens_one_nested_level() {
        let text = flatten_json(r#"{"req":{"method":"GET","url":"/x"},"ip":"1.2.3.4"}"#).unwrap();
        assert!(text.contains("req_method=GET"));
        assert!(text.contains("req_url=/x"));
        assert!(text.contains("ip=1.2.3.4"));
    }

    #[test]
    fn skips_nulls() {
        let text = flatten_json(r#"{"a":null,"b":{"c":null,"d":1}}"#).unwrap();
        assert_eq!(text, "b_d=1");
    }

    #[test]
    fn deeper_nesting_renders_as_json() {
        let text = flatten_json(r#"{"outer":{"inner":{"deep":true}}}"#).unwrap();
        assert_eq!(text, r#"outer_inner={"deep":true}"#);
    }

    #[test]
    fn non_object_is_an_error() {
        assert!(matches!(flatten_json("[]"), Err(FlattenError::NotAnObject)));
        assert!(matches!(flatten_json("42"), Err(FlattenError::NotAnObject)));
        assert!(matches!(flatten_json("{broken"), Err(FlattenError::Parse(_))));
    }
}
