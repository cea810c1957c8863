use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Denied,
    NotFound,
    Upstream,
    Internal,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::InvalidParams => "invalid_params",
            ToolErrorKind::Denied => "denied",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Upstream => "upstream",
            ToolErrorKind::Internal => "internal",
        }
    }
}

/// Error surfaced at the tool boundary. Every failure a handler can produce is
/// folded into this shape before it is rendered as a JSON-RPC error.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Denied, "DENIED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    /// Non-2xx or transport failure from the upstream API. The status, when
    /// known, is carried in `details.status`.
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        let err = Self::new(ToolErrorKind::Upstream, "UPSTREAM", message);
        match status {
            Some(status) => err.with_details(serde_json::json!({ "status": status })),
            None => err,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn status(&self) -> Option<u16> {
        self.details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u16)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_carries_status_in_details() {
        let err = ToolError::upstream(Some(404), "Action lookup failed");
        assert_eq!(err.kind, ToolErrorKind::Upstream);
        assert_eq!(err.status(), Some(404));
        assert!(!err.retryable);
    }

    #[test]
    fn upstream_error_without_status_has_no_details() {
        let err = ToolError::upstream(None, "connection refused");
        assert!(err.details.is_none());
        assert_eq!(err.status(), None);
    }
}
