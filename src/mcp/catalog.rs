use crate::errors::{ErrorCode, McpError};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

const MAX_REPORTED_ERRORS: usize = 10;

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

/// Catalog entries for which `is_registered` holds, in catalog order. A tool
/// with no handler is never advertised.
pub fn list_tools<F>(is_registered: F) -> Vec<ToolDef>
where
    F: Fn(&str) -> bool,
{
    TOOL_CATALOG
        .iter()
        .filter(|tool| is_registered(&tool.name))
        .cloned()
        .collect()
}

/// Null arguments are checked as an empty object.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let empty = Value::Object(Default::default());
    let instance = if args.is_null() { &empty } else { args };
    if let Err(errors) = schema.validate(instance) {
        let message = format_schema_errors(tool_name, errors);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(tool_name: &str, errors: jsonschema::ErrorIterator) -> String {
    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];

    for err in errors.take(MAX_REPORTED_ERRORS) {
        let instance_path = if err.instance_path.to_string().is_empty() {
            "(root)".to_string()
        } else {
            err.instance_path.to_string()
        };
        let line = match &err.kind {
            jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
                if unexpected.is_empty() {
                    format!("{}: unknown field", instance_path)
                } else {
                    unexpected
                        .iter()
                        .map(|field| format!("{}: unknown field '{}'", instance_path, field))
                        .collect::<Vec<_>>()
                        .join("\n- ")
                }
            }
            jsonschema::error::ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| {
                                v.as_str()
                                    .map(|s| s.to_string())
                                    .unwrap_or_else(|| v.to_string())
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                if allowed.is_empty() {
                    format!("{}: invalid value", instance_path)
                } else {
                    format!("{}: expected one of {}", instance_path, allowed.join(", "))
                }
            }
            jsonschema::error::ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| property.to_string());
                format!("{}: missing required field '{}'", instance_path, prop)
            }
            jsonschema::error::ValidationErrorKind::Type { kind } => {
                format!("{}: expected {}", instance_path, format_type_kind(kind))
            }
            _ => format!("{}: {}", instance_path, err),
        };
        lines.push(format!("- {}", line));
    }
    lines.join("\n")
}

fn format_type_kind(kind: &jsonschema::error::TypeKind) -> String {
    match kind {
        jsonschema::error::TypeKind::Single(primitive) => primitive.to_string(),
        jsonschema::error::TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}
