use crate::errors::ToolError;
use serde_json::{Map, Value};

/// Argument checks shared by the tool handlers. Schema validation has already
/// run by the time these are called; they turn loose JSON into typed values.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: &Value, label: &str) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(val) => self.ensure_string(val, label).map(Some),
        }
    }

    pub fn ensure_field(&self, args: &Value, field: &str) -> Result<String, ToolError> {
        match args.get(field) {
            Some(value) if !value.is_null() => self.ensure_string(value, field),
            _ => Err(ToolError::invalid_params(format!("{} is required", field))),
        }
    }

    pub fn ensure_object(&self, value: &Value, label: &str) -> Result<Map<String, Value>, ToolError> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| ToolError::invalid_params(format!("{} must be an object", label)))
    }

    /// Absent or null yields an empty map.
    pub fn ensure_optional_object(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Map<String, Value>, ToolError> {
        match value {
            None => Ok(Map::new()),
            Some(val) if val.is_null() => Ok(Map::new()),
            Some(val) => self.ensure_object(val, label),
        }
    }

    pub fn ensure_flag(&self, value: Option<&Value>, label: &str) -> Result<bool, ToolError> {
        match value {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(_) => Err(ToolError::invalid_params(format!(
                "{} must be a boolean",
                label
            ))),
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
