use crate::constants::tools::{ACTION_KNOWLEDGE, EXECUTE_ACTION, LIST_INTEGRATIONS, SEARCH_ACTIONS};
use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::{list_tools, tool_catalog, ToolDef};
use crate::services::api_client::ApiClient;
use crate::services::config::GatewayConfig;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: Arc<GatewayConfig>,
    pub client: ApiClient,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    /// Every catalog tool needs a handler, except the execute tool which is
    /// left out on purpose in knowledge-only mode.
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
        knowledge_only: bool,
    ) -> Result<(), ToolError> {
        let mut missing = Vec::new();
        for tool in tool_catalog().iter() {
            if handlers.contains_key(&tool.name) {
                continue;
            }
            if knowledge_only && tool.name == EXECUTE_ACTION {
                continue;
            }
            missing.push(tool.name.clone());
        }
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a registered handler")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(config: GatewayConfig) -> Result<Self, ToolError> {
        let logger = Logger::new("pica");
        let validation = Validation::new();
        let config = Arc::new(config);
        let client = ApiClient::new(config.clone(), &logger)?;

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(
            LIST_INTEGRATIONS.to_string(),
            Arc::new(managers::integrations::IntegrationsManager::new(
                logger.clone(),
                client.clone(),
            )),
        );
        handlers.insert(
            SEARCH_ACTIONS.to_string(),
            Arc::new(managers::actions::ActionsManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );
        handlers.insert(
            ACTION_KNOWLEDGE.to_string(),
            Arc::new(managers::knowledge::KnowledgeManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );
        if !config.knowledge_only {
            handlers.insert(
                EXECUTE_ACTION.to_string(),
                Arc::new(managers::execute::ExecuteManager::new(
                    logger.clone(),
                    validation.clone(),
                    client.clone(),
                )),
            );
        }

        Self::validate_tool_wiring(&handlers, config.knowledge_only)?;
        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        logger.info("Gateway configured", Some(&config.summary()));

        Ok(Self {
            logger,
            config,
            client,
            tool_executor,
        })
    }

    /// Tools advertised to clients; only those with a registered handler.
    pub fn tool_definitions(&self) -> Vec<ToolDef> {
        list_tools(|name| self.tool_executor.has_tool(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_only_mode_drops_the_execute_tool() {
        let mut config = GatewayConfig::new("sk_test_123456");
        config.knowledge_only = true;
        let app = App::initialize(config).unwrap();
        let names: Vec<String> = app.tool_definitions().into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 3);
        assert!(!names.iter().any(|n| n == EXECUTE_ACTION));
        assert!(!app.tool_executor.has_tool(EXECUTE_ACTION));
    }

    #[test]
    fn default_mode_registers_every_catalog_tool() {
        let app = App::initialize(GatewayConfig::new("sk_test_123456")).unwrap();
        assert_eq!(app.tool_definitions().len(), tool_catalog().len());
    }

    #[test]
    fn wiring_check_reports_missing_handlers() {
        let err = App::validate_tool_wiring(&HashMap::new(), true).unwrap_err();
        let missing = err.details.unwrap()["missing_tools"].clone();
        assert_eq!(
            missing,
            serde_json::json!([ACTION_KNOWLEDGE, LIST_INTEGRATIONS, SEARCH_ACTIONS])
        );
    }
}
