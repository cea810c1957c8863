use crate::errors::ToolError;
use crate::services::api_client::ApiClient;
use crate::services::logger::Logger;
use serde_json::Value;

/// Lists the caller's active connections next to the platforms they could
/// connect.
#[derive(Clone)]
pub struct IntegrationsManager {
    logger: Logger,
    client: ApiClient,
}

impl IntegrationsManager {
    pub fn new(logger: Logger, client: ApiClient) -> Self {
        Self {
            logger: logger.child("integrations"),
            client,
        }
    }

    pub async fn list(&self) -> Result<Value, ToolError> {
        self.client.initialize().await;

        let connections: Vec<Value> = self
            .client
            .user_connections()
            .into_iter()
            .filter(|connection| connection.active)
            .map(|connection| {
                serde_json::json!({
                    "key": connection.key,
                    "platform": connection.platform,
                    "tags": connection.tags,
                })
            })
            .collect();
        let platforms: Vec<Value> = self
            .client
            .available_connectors()
            .into_iter()
            .filter(|entry| entry.is_eligible())
            .map(|entry| {
                serde_json::json!({
                    "platform": entry.platform,
                    "name": entry.name,
                    "category": entry.category,
                })
            })
            .collect();

        Ok(serde_json::json!({
            "summary": {
                "connectedCount": connections.len(),
                "availableCount": platforms.len(),
            },
            "connections": connections,
            "availablePlatforms": platforms,
        }))
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for IntegrationsManager {
    async fn handle(&self, _args: Value) -> Result<Value, ToolError> {
        self.logger.debug("list", None);
        self.list().await
    }
}
