use crate::errors::ToolError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Missing value for path variable '{name}'")]
    MissingVariable { name: String },
}

impl From<TemplateError> for ToolError {
    fn from(err: TemplateError) -> Self {
        match &err {
            TemplateError::MissingVariable { name } => ToolError::invalid_params(err.to_string())
                .with_hint(format!(
                    "Pass pathVariables.{} (zero and false are accepted, empty strings are not)",
                    name
                ))
                .with_details(serde_json::json!({ "variable": name })),
        }
    }
}

/// Substitutes `{{name}}` and then `{name}` tokens in an action path with the
/// percent-encoded value of `variables[name]`.
///
/// Double-brace tokens are resolved first; the single-brace pass runs over the
/// output of that pass.
pub fn resolve_path(template: &str, variables: &Map<String, Value>) -> Result<String, TemplateError> {
    let first = substitute(template, "{{", "}}", variables)?;
    substitute(&first, "{", "}", variables)
}

/// Names referenced by a path template, in order of first appearance.
pub fn template_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let tail = rest[start..].trim_start_matches('{');
        let Some(end) = tail.find('}') else {
            break;
        };
        let name = &tail[..end];
        if is_variable_name(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = tail[end..].trim_start_matches('}');
    }
    names
}

fn substitute(
    template: &str,
    open: &str,
    close: &str,
    variables: &Map<String, Value>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(open) {
        let (prefix, tail) = rest.split_at(start);
        out.push_str(prefix);
        let body = &tail[open.len()..];
        match body.find(close) {
            Some(end) if is_variable_name(&body[..end]) => {
                out.push_str(&encoded_value(&body[..end], variables)?);
                rest = &body[end + close.len()..];
            }
            _ => {
                // Not a token; keep the opening brace and rescan after it.
                out.push_str(open);
                rest = body;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('{') && !name.contains('}')
}

fn encoded_value(name: &str, variables: &Map<String, Value>) -> Result<String, TemplateError> {
    let missing = || TemplateError::MissingVariable {
        name: name.to_string(),
    };
    let rendered = match variables.get(name) {
        None | Some(Value::Null) => return Err(missing()),
        Some(Value::String(text)) if text.is_empty() => return Err(missing()),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(num)) => num.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    };
    Ok(urlencoding::encode(&rendered).into_owned())
}
