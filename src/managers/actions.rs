use crate::errors::ToolError;
use crate::services::access_control::visible_actions;
use crate::services::api_client::{Action, AgentContext, ApiClient};
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use serde_json::Value;

/// Ranked search when a query is given, otherwise the platform's full
/// supported action list. Either way only actions the caller may use are
/// returned.
#[derive(Clone)]
pub struct ActionsManager {
    logger: Logger,
    validation: Validation,
    client: ApiClient,
}

impl ActionsManager {
    pub fn new(logger: Logger, validation: Validation, client: ApiClient) -> Self {
        Self {
            logger: logger.child("actions"),
            validation,
            client,
        }
    }

    fn agent_context(&self, raw: Option<String>) -> Result<AgentContext, ToolError> {
        match raw {
            Some(raw) => AgentContext::parse(&raw).ok_or_else(|| {
                ToolError::invalid_params(format!("Unknown agentType '{}'", raw))
                    .with_hint("agentType must be 'knowledge' or 'execute'")
            }),
            None if self.client.config().knowledge_only => Ok(AgentContext::Knowledge),
            None => Ok(AgentContext::Execute),
        }
    }

    pub async fn find(&self, args: Value) -> Result<Value, ToolError> {
        let platform = self.validation.ensure_field(&args, "platform")?;
        let query = match args.get("query") {
            Some(Value::String(text)) if text.trim().is_empty() => None,
            other => self.validation.ensure_optional_string(other, "query")?,
        };
        let context = self.agent_context(
            self.validation
                .ensure_optional_string(args.get("agentType"), "agentType")?,
        )?;

        self.client.initialize().await;

        let (mode, found) = match query.as_deref() {
            Some(query) => (
                "search",
                self.client.search_actions(&platform, query, context).await?,
            ),
            None => ("list", self.client.list_platform_actions(&platform).await?),
        };
        let received = found.len();
        let actions = visible_actions(found, self.client.config());
        if actions.len() < received {
            self.logger.debug(
                "Filtered actions outside permissions or allowlist",
                Some(&serde_json::json!({
                    "platform": &platform,
                    "received": received,
                    "kept": actions.len(),
                })),
            );
        }

        Ok(serde_json::json!({
            "platform": platform,
            "mode": mode,
            "query": query,
            "total": actions.len(),
            "actions": actions.iter().map(summarize).collect::<Vec<_>>(),
        }))
    }
}

fn summarize(action: &Action) -> Value {
    serde_json::json!({
        "actionId": action.id,
        "title": action.title,
        "method": action.method,
        "path": action.path,
        "tags": action.tags,
    })
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for ActionsManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("find", args.get("platform"));
        self.find(args).await
    }
}
