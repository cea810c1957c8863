use crate::errors::ToolError;
use serde_json::Value;

/// Renders one form field. Strings pass through as-is; numbers, booleans,
/// arrays and nested objects become their JSON text.
pub fn stringify_field(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        _ => value.to_string(),
    }
}

/// Flattens a body object into `(name, value)` pairs. Null fields are skipped.
pub fn form_fields(body: &Value) -> Result<Vec<(String, String)>, ToolError> {
    let obj = body.as_object().ok_or_else(|| {
        ToolError::invalid_params("data must be an object when isFormData or isFormUrlEncoded is set")
    })?;
    Ok(obj
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), stringify_field(value)))
        .collect())
}

pub fn encode_form_urlencoded(body: &Value) -> Result<String, ToolError> {
    let fields = form_fields(body)?;
    serde_urlencoded::to_string(fields)
        .map_err(|err| ToolError::invalid_params(format!("data could not be URL-encoded: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_are_json_stringified() {
        let encoded = encode_form_urlencoded(&json!({"a": {"b": 1}, "c": "x"})).unwrap();
        let decoded: Vec<(String, String)> = serde_urlencoded::from_str(&encoded).unwrap();
        assert!(decoded.contains(&("a".to_string(), "{\"b\":1}".to_string())));
        assert!(decoded.contains(&("c".to_string(), "x".to_string())));
    }

    #[test]
    fn scalars_render_without_quotes() {
        let fields = form_fields(&json!({"n": 3, "flag": true, "skip": null})).unwrap();
        assert!(fields.contains(&("n".to_string(), "3".to_string())));
        assert!(fields.contains(&("flag".to_string(), "true".to_string())));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = form_fields(&json!(["a", "b"])).unwrap_err();
        assert_eq!(err.kind, crate::errors::ToolErrorKind::InvalidParams);
    }
}
