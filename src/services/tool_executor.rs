use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::services::logger::Logger;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Dispatches tool calls to registered handlers and wraps their results.
#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_tool(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    fn wrap_result(
        &self,
        tool: &str,
        result: Value,
        trace_id: &str,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Value {
        serde_json::json!({
            "tool": tool,
            "result": result,
            "meta": {
                "trace_id": trace_id,
                "started_at": started_at.to_rfc3339(),
                "duration_ms": (chrono::Utc::now() - started_at).num_milliseconds(),
            },
        })
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let started_at = chrono::Utc::now();
        let Some(handler) = self.handlers.get(tool) else {
            return Err(ToolError::invalid_params(format!("Unknown tool: {}", tool))
                .with_hint(format!("Available tools: {}", self.tool_names().join(", "))));
        };
        let trace_id = uuid::Uuid::new_v4().to_string();

        self.logger.debug(
            "Tool call started",
            Some(&serde_json::json!({ "tool": tool, "trace_id": &trace_id })),
        );

        match handler.handle(args).await {
            Ok(result) => {
                let payload = self.wrap_result(tool, result, &trace_id, started_at);
                self.logger.info(
                    "Tool call finished",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": &trace_id,
                        "duration_ms": payload["meta"]["duration_ms"].clone(),
                    })),
                );
                Ok(payload)
            }
            Err(err) => {
                self.logger.warn(
                    "Tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": &trace_id,
                        "kind": err.kind,
                        "message": &err.message,
                        "status": err.status(),
                    })),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(&self, args: Value) -> Result<Value, ToolError> {
            Ok(args)
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHandler for Failing {
        async fn handle(&self, _args: Value) -> Result<Value, ToolError> {
            Err(ToolError::denied("nope"))
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("echo".to_string(), Arc::new(Echo));
        handlers.insert("failing".to_string(), Arc::new(Failing));
        ToolExecutor::new(Logger::new("test"), handlers)
    }

    #[tokio::test]
    async fn results_are_wrapped_in_an_envelope() {
        let payload = executor()
            .execute("echo", serde_json::json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(payload["tool"], "echo");
        assert_eq!(payload["result"]["x"], 1);
        assert!(payload["meta"]["trace_id"].as_str().is_some());
        assert!(payload["meta"]["duration_ms"].as_i64().is_some());
    }

    #[tokio::test]
    async fn unknown_tool_lists_registered_names() {
        let err = executor()
            .execute("missing", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Unknown tool: missing");
        assert_eq!(err.hint.as_deref(), Some("Available tools: echo, failing"));
    }

    #[tokio::test]
    async fn handler_errors_pass_through_unchanged() {
        let err = executor().execute("failing", Value::Null).await.unwrap_err();
        assert_eq!(err.kind, crate::errors::ToolErrorKind::Denied);
    }
}
