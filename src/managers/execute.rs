use crate::errors::ToolError;
use crate::services::access_control::{
    ensure_action_allowed, ensure_connection_allowed, ensure_method_allowed,
};
use crate::services::api_client::{ApiClient, PassthroughArgs};
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use serde_json::Value;

/// Runs one action through the passthrough endpoint. Every authorization
/// check runs before anything side-effecting is sent.
#[derive(Clone)]
pub struct ExecuteManager {
    logger: Logger,
    validation: Validation,
    client: ApiClient,
}

impl ExecuteManager {
    pub fn new(logger: Logger, validation: Validation, client: ApiClient) -> Self {
        Self {
            logger: logger.child("execute"),
            validation,
            client,
        }
    }

    /// `actionId` wins over `action._id` when both are present.
    fn action_reference(&self, args: &Value) -> Result<(String, Option<String>), ToolError> {
        if let Some(id) = self
            .validation
            .ensure_optional_string(args.get("actionId"), "actionId")?
        {
            return Ok((id, None));
        }
        let Some(action) = args.get("action").filter(|v| !v.is_null()) else {
            return Err(ToolError::invalid_params("actionId or action._id is required")
                .with_hint("Use an actionId returned by search_pica_platform_actions"));
        };
        let id = self.validation.ensure_field(action, "_id")?;
        let path = self
            .validation
            .ensure_optional_string(action.get("path"), "action.path")?;
        Ok((id, path))
    }

    fn passthrough_args(&self, args: &Value, action_id: String) -> Result<PassthroughArgs, ToolError> {
        Ok(PassthroughArgs {
            platform: self.validation.ensure_field(args, "platform")?,
            action_id,
            connection_key: self.validation.ensure_field(args, "connectionKey")?,
            data: args.get("data").filter(|v| !v.is_null()).cloned(),
            path_variables: self
                .validation
                .ensure_optional_object(args.get("pathVariables"), "pathVariables")?,
            query_params: self
                .validation
                .ensure_optional_object(args.get("queryParams"), "queryParams")?,
            headers: self
                .validation
                .ensure_optional_object(args.get("headers"), "headers")?,
            is_form_data: self.validation.ensure_flag(args.get("isFormData"), "isFormData")?,
            is_form_url_encoded: self
                .validation
                .ensure_flag(args.get("isFormUrlEncoded"), "isFormUrlEncoded")?,
        })
    }

    pub async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let (action_id, path_hint) = self.action_reference(&args)?;
        let request = self.passthrough_args(&args, action_id)?;
        let config = self.client.config();

        ensure_action_allowed(&request.action_id, config)?;
        ensure_connection_allowed(&request.connection_key, config)?;

        self.client.initialize().await;
        let mut action = self.client.action_details(&request.action_id).await?;
        ensure_method_allowed(&action.method, config.permission_level)?;
        if action.path.trim().is_empty() {
            if let Some(path) = path_hint {
                action.path = path;
            }
        }

        self.logger.info(
            "Executing action",
            Some(&serde_json::json!({
                "platform": &request.platform,
                "action_id": &action.id,
                "method": &action.method,
            })),
        );
        let result = self.client.execute_passthrough(&request, Some(&action)).await?;

        Ok(serde_json::json!({
            "platform": request.platform,
            "action": {
                "actionId": action.id,
                "title": action.title,
                "method": action.method,
            },
            "requestConfig": result.request_config,
            "responseData": result.response_data,
        }))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for ExecuteManager {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.logger.debug("execute", args.get("actionId"));
        self.execute(args).await
    }
}
