use crate::constants::tools::EXECUTE_ACTION;
use crate::constants::upstream::PASSTHROUGH_PATH;
use crate::errors::ToolError;
use crate::services::access_control::{ensure_action_allowed, is_method_allowed};
use crate::services::api_client::{Action, ApiClient};
use crate::services::config::GatewayConfig;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use crate::utils::path_template::template_variables;
use serde_json::Value;

#[derive(Clone)]
pub struct KnowledgeManager {
    logger: Logger,
    validation: Validation,
    client: ApiClient,
}

impl KnowledgeManager {
    pub fn new(logger: Logger, validation: Validation, client: ApiClient) -> Self {
        Self {
            logger: logger.child("knowledge"),
            validation,
            client,
        }
    }

    pub async fn describe(&self, args: Value) -> Result<Value, ToolError> {
        let action_id = self.validation.ensure_field(&args, "actionId")?;
        let platform = self.validation.ensure_field(&args, "platform")?;
        ensure_action_allowed(&action_id, self.client.config())?;

        self.client.initialize().await;
        let action = self.client.action_details(&action_id).await?;
        let knowledge = ApiClient::knowledge_of(&action);
        let instructions = guidance(self.client.config(), &platform, &action);

        Ok(serde_json::json!({
            "actionId": action.id,
            "platform": platform,
            "title": action.title,
            "method": knowledge.method,
            "path": action.path,
            "knowledge": knowledge.knowledge,
            "guidance": instructions,
        }))
    }
}

/// Plain-text instructions for turning the knowledge into a call.
fn guidance(config: &GatewayConfig, platform: &str, action: &Action) -> String {
    let method = action.method.to_uppercase();
    let mut lines = vec![format!(
        "Requests for this action are sent as {} {}{}{}.",
        method, config.base_url, PASSTHROUGH_PATH, action.path
    )];

    let variables = template_variables(&action.path);
    if !variables.is_empty() {
        lines.push(format!(
            "Provide pathVariables for: {}.",
            variables.join(", ")
        ));
    }
    lines.push(
        "Bodies are sent as JSON unless isFormData or isFormUrlEncoded is set; nested objects in form bodies are sent as JSON strings."
            .to_string(),
    );
    if action.is_custom() && method != "GET" {
        lines.push("The connection key is added to the request body automatically.".to_string());
    }

    if config.knowledge_only {
        lines.push("Execution is disabled on this server; use these details to build the request yourself.".to_string());
    } else if !is_method_allowed(&method, config.permission_level) {
        lines.push(format!(
            "{} is not permitted at permission level '{}', so {} will refuse this action.",
            method,
            config.permission_level.as_str(),
            EXECUTE_ACTION
        ));
    } else {
        lines.push(format!(
            "Call {} with platform \"{}\", actionId \"{}\" and a connectionKey for {} from list_pica_integrations.",
            EXECUTE_ACTION, platform, action.id, platform
        ));
    }
    lines.join("\n")
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for KnowledgeManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("describe", args.get("actionId"));
        self.describe(args).await
    }
}
