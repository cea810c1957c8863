use super::{ToolError, ToolErrorKind};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: ErrorCode,
    pub message: String,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Renders a tool failure as a JSON-RPC error. The message is a small
    /// line-oriented report so agents can read kind, code and hint without
    /// parsing nested JSON.
    pub fn from_tool_error(tool: &str, error: &ToolError) -> Self {
        let mut lines = vec![
            "PicaError".to_string(),
            format!("tool: {}", tool),
            format!("kind: {}", error.kind.as_str()),
            format!("code: {}", error.code),
            format!("message: {}", error.message),
        ];
        if let Some(status) = error.status() {
            lines.push(format!("status: {}", status));
        }
        if let Some(hint) = &error.hint {
            lines.push(format!("hint: {}", hint));
        }
        let message = lines.join("\n");

        let code = match error.kind {
            ToolErrorKind::InvalidParams => ErrorCode::InvalidParams,
            ToolErrorKind::Denied | ToolErrorKind::NotFound => ErrorCode::InvalidRequest,
            ToolErrorKind::Upstream | ToolErrorKind::Internal => ErrorCode::InternalError,
        };
        McpError::new(code, message)
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for McpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_tool_error_maps_to_invalid_request() {
        let err = ToolError::denied("Action 'a1' is not in the allowed action list")
            .with_hint("Ask an operator to extend PICA_ACTION_IDS");
        let mapped = McpError::from_tool_error("execute_pica_action", &err);
        assert_eq!(mapped.code, ErrorCode::InvalidRequest);
        assert!(mapped.message.contains("kind: denied"));
        assert!(mapped.message.contains("hint: Ask an operator"));
    }

    #[test]
    fn multi_word_kinds_render_in_snake_case() {
        let invalid = McpError::from_tool_error("t", &ToolError::invalid_params("platform is required"));
        assert!(invalid.message.contains("kind: invalid_params"));
        let missing = McpError::from_tool_error("t", &ToolError::not_found("Action 'a1' was not found"));
        assert!(missing.message.contains("kind: not_found"));
    }

    #[test]
    fn upstream_tool_error_reports_status_line() {
        let err = ToolError::upstream(Some(502), "Bad gateway from upstream");
        let mapped = McpError::from_tool_error("list_pica_integrations", &err);
        assert_eq!(mapped.code, ErrorCode::InternalError);
        assert!(mapped.message.contains("status: 502"));
    }
}
