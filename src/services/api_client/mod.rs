//! Client for the upstream aggregation API.
//!
//! Owns the shared secret and base URL, caches the caller's connections and
//! the platform catalog, and performs search, detail and passthrough calls.
//! Upstream record shapes are translated to [`Action`] here and nowhere else.

mod models;
mod request;

pub use models::{Action, ActionKnowledge, Connection, PlatformEntry};
pub use request::{
    build_request_config, BodyEncoding, PassthroughArgs, RequestBody, RequestConfig,
};

use crate::constants::headers::SECRET;
use crate::constants::limits::ERROR_BODY_PREVIEW_BYTES;
use crate::constants::pagination::PAGE_SIZE;
use crate::constants::search::RESULT_LIMIT;
use crate::constants::upstream::{
    CONNECTIONS_PATH, CONNECTORS_PATH, KNOWLEDGE_PATH, SEARCH_PATH, USER_AGENT,
};
use crate::errors::ToolError;
use crate::services::config::{AllowList, GatewayConfig};
use crate::services::logger::Logger;
use crate::services::pagination::{fetch_all_pages, Page};
use crate::utils::redact::redact_text;
use futures::future::{BoxFuture, FutureExt, Shared};
use models::{KnowledgeRecord, RowSet, SearchRecord};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Relevance hint passed to the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentContext {
    Knowledge,
    Execute,
}

impl AgentContext {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "knowledge" => Some(AgentContext::Knowledge),
            "execute" => Some(AgentContext::Execute),
            _ => None,
        }
    }

    fn query_flag(self) -> &'static str {
        match self {
            AgentContext::Knowledge => "knowledgeAgent",
            AgentContext::Execute => "executeAgent",
        }
    }
}

/// Outcome of one cache load. Errors are recorded per side, never raised.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheReport {
    pub connections: usize,
    pub platforms: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassthroughResult {
    pub request_config: RequestConfig,
    pub response_data: Value,
}

type InitHandle = Shared<BoxFuture<'static, CacheReport>>;

enum InitState {
    Uninitialized,
    Initializing(InitHandle),
    Ready,
}

struct ClientInner {
    config: Arc<GatewayConfig>,
    http: Client,
    logger: Logger,
    connections: RwLock<Vec<Connection>>,
    platforms: RwLock<Vec<PlatformEntry>>,
    init: Mutex<InitState>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(config: Arc<GatewayConfig>, logger: &Logger) -> Result<Self, ToolError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                http,
                logger: logger.child("client"),
                connections: RwLock::new(Vec::new()),
                platforms: RwLock::new(Vec::new()),
                init: Mutex::new(InitState::Uninitialized),
            }),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Loads both caches on first use. Concurrent callers share one in-flight
    /// load; later calls return immediately.
    pub async fn initialize(&self) {
        let handle = {
            let mut state = self.inner.init.lock().await;
            let in_flight = match &*state {
                InitState::Ready => return,
                InitState::Initializing(handle) => Some(handle.clone()),
                InitState::Uninitialized => None,
            };
            match in_flight {
                Some(handle) => handle,
                None => {
                    let client = self.clone();
                    let handle: InitHandle =
                        async move { client.load_caches().await }.boxed().shared();
                    *state = InitState::Initializing(handle.clone());
                    handle
                }
            }
        };

        let report = handle.await;

        let mut state = self.inner.init.lock().await;
        if matches!(*state, InitState::Initializing(_)) {
            *state = InitState::Ready;
            self.inner.logger.info(
                "Client initialized",
                serde_json::to_value(&report).ok().as_ref(),
            );
        }
    }

    pub async fn is_initialized(&self) -> bool {
        matches!(*self.inner.init.lock().await, InitState::Ready)
    }

    /// Re-fetches both caches regardless of initialization state.
    pub async fn refresh(&self) -> CacheReport {
        let report = self.load_caches().await;
        self.inner.logger.info(
            "Caches refreshed",
            serde_json::to_value(&report).ok().as_ref(),
        );
        report
    }

    pub fn user_connections(&self) -> Vec<Connection> {
        self.inner
            .connections
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn available_connectors(&self) -> Vec<PlatformEntry> {
        self.inner
            .platforms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Both fetches run to completion; a failing side is logged and cached as
    /// empty without affecting the other.
    async fn load_caches(&self) -> CacheReport {
        let (connections, platforms) =
            tokio::join!(self.fetch_connections(), self.fetch_available_connectors());

        let mut report = CacheReport::default();
        let connections = match connections {
            Ok(rows) => rows,
            Err(err) => {
                self.inner.logger.warn(
                    "Failed to load connections",
                    Some(&serde_json::json!({ "error": &err.message, "status": err.status() })),
                );
                report.connections_error = Some(err.message);
                Vec::new()
            }
        };
        let platforms = match platforms {
            Ok(rows) => rows,
            Err(err) => {
                self.inner.logger.warn(
                    "Failed to load platform catalog",
                    Some(&serde_json::json!({ "error": &err.message, "status": err.status() })),
                );
                report.catalog_error = Some(err.message);
                Vec::new()
            }
        };
        report.connections = connections.len();
        report.platforms = platforms.len();

        *self
            .inner
            .connections
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = connections;
        *self
            .inner
            .platforms
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = platforms;
        report
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, ToolError> {
        let config = self.config();
        let mut params = Vec::new();
        if let Some(identity) = &config.identity {
            params.push(("identity".to_string(), identity.clone()));
        }
        if let Some(identity_type) = &config.identity_type {
            params.push(("identityType".to_string(), identity_type.clone()));
        }
        match &config.connection_keys {
            AllowList::Any => {}
            AllowList::Only(keys) if keys.is_empty() => {
                self.inner
                    .logger
                    .debug("Connection allowlist is empty; skipping fetch", None);
                return Ok(Vec::new());
            }
            AllowList::Only(keys) => params.push(("key".to_string(), keys.join(","))),
        }
        self.fetch_paginated(CONNECTIONS_PATH, &params).await
    }

    async fn fetch_available_connectors(&self) -> Result<Vec<PlatformEntry>, ToolError> {
        self.fetch_paginated(CONNECTORS_PATH, &[]).await
    }

    /// Up to five actions in upstream relevance order.
    pub async fn search_actions(
        &self,
        platform: &str,
        query: &str,
        context: AgentContext,
    ) -> Result<Vec<Action>, ToolError> {
        let path = format!("{}/{}", SEARCH_PATH, urlencoding::encode(platform));
        let params = vec![
            ("query".to_string(), query.to_string()),
            ("limit".to_string(), RESULT_LIMIT.to_string()),
            (context.query_flag().to_string(), "true".to_string()),
        ];
        let rows: RowSet<SearchRecord> = self.get_json(&path, &params).await?;
        Ok(rows
            .into_rows()
            .into_iter()
            .take(RESULT_LIMIT)
            .map(Action::from)
            .collect())
    }

    /// Every supported action for `platform`, across all pages.
    pub async fn list_platform_actions(&self, platform: &str) -> Result<Vec<Action>, ToolError> {
        let params = vec![
            ("supported".to_string(), "true".to_string()),
            ("connectionPlatform".to_string(), platform.to_string()),
        ];
        let rows: Vec<KnowledgeRecord> = self.fetch_paginated(KNOWLEDGE_PATH, &params).await?;
        Ok(rows.into_iter().map(Action::from).collect())
    }

    /// Looks an action up by exact id. If upstream returns several rows the
    /// first one is used.
    pub async fn action_details(&self, action_id: &str) -> Result<Action, ToolError> {
        let params = vec![("_id".to_string(), action_id.to_string())];
        let rows: RowSet<KnowledgeRecord> = self.get_json(KNOWLEDGE_PATH, &params).await?;
        rows.into_rows()
            .into_iter()
            .next()
            .map(Action::from)
            .ok_or_else(|| {
                ToolError::not_found(format!("Action '{}' was not found", action_id))
                    .with_hint("Search the platform's actions again to get a current action id")
            })
    }

    pub async fn action_knowledge(&self, action_id: &str) -> Result<ActionKnowledge, ToolError> {
        let action = self.action_details(action_id).await?;
        Ok(Self::knowledge_of(&action))
    }

    /// Documentation and method for an already fetched action, with
    /// placeholders standing in for missing fields.
    pub fn knowledge_of(action: &Action) -> ActionKnowledge {
        ActionKnowledge::from_action(action)
    }

    /// Builds and sends the forwarded call. When `action` is `None` its
    /// details are fetched by `args.action_id` first.
    pub async fn execute_passthrough(
        &self,
        args: &PassthroughArgs,
        action: Option<&Action>,
    ) -> Result<PassthroughResult, ToolError> {
        let fetched;
        let action = match action {
            Some(action) => action,
            None => {
                fetched = self.action_details(&args.action_id).await?;
                &fetched
            }
        };

        let config = build_request_config(self.config(), action, args)?;
        let sanitized = config.sanitized();
        self.inner.logger.debug(
            "Sending passthrough request",
            Some(&serde_json::json!({
                "method": sanitized.method,
                "url": sanitized.url,
                "action_id": action.id,
            })),
        );

        let method = Method::from_bytes(config.method.as_bytes()).map_err(|_| {
            ToolError::invalid_params(format!("Unsupported HTTP method '{}'", config.method))
        })?;
        let multipart = matches!(config.data, Some(RequestBody::Multipart(_)));
        let headers = to_header_map(&config, multipart)?;

        let mut req = self.inner.http.request(method, &config.url).headers(headers);
        if let Some(params) = &config.params {
            req = req.query(params);
        }
        req = match &config.data {
            None => req,
            Some(RequestBody::Json(body)) => {
                let bytes = serde_json::to_vec(body).map_err(|err| {
                    ToolError::internal(format!("Failed to encode request body: {}", err))
                })?;
                req.body(bytes)
            }
            Some(RequestBody::UrlEncoded(body)) => req.body(body.clone()),
            Some(RequestBody::Multipart(fields)) => {
                let form = fields
                    .iter()
                    .fold(reqwest::multipart::Form::new(), |form, (key, value)| {
                        form.text(key.clone(), value.clone())
                    });
                req.multipart(form)
            }
        };

        let response = req.send().await.map_err(|err| self.map_reqwest_error(err))?;
        let response = self.ensure_success(response, "Passthrough request").await?;
        let text = response
            .text()
            .await
            .map_err(|err| self.map_reqwest_error(err))?;
        let response_data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(PassthroughResult {
            request_config: sanitized,
            response_data,
        })
    }

    /// Walks a skip/limit listing under `path` until its reported total.
    pub async fn fetch_paginated<T>(
        &self,
        path: &str,
        extra_params: &[(String, String)],
    ) -> Result<Vec<T>, ToolError>
    where
        T: DeserializeOwned,
    {
        let logger = self.inner.logger.child("pagination");
        fetch_all_pages(&logger, path, PAGE_SIZE, |skip, limit| {
            let mut params = extra_params.to_vec();
            params.push(("skip".to_string(), skip.to_string()));
            params.push(("limit".to_string(), limit.to_string()));
            async move { self.get_json::<Page<T>>(path, &params).await }
        })
        .await
    }

    async fn get_json<R>(&self, path: &str, params: &[(String, String)]) -> Result<R, ToolError>
    where
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config().base_url, path);
        let response = self
            .inner
            .http
            .get(&url)
            .header(SECRET, self.config().secret.as_str())
            .query(params)
            .send()
            .await
            .map_err(|err| self.map_reqwest_error(err))?;
        let response = self
            .ensure_success(response, &format!("GET {}", path))
            .await?;
        response.json::<R>().await.map_err(|err| {
            ToolError::upstream(
                None,
                format!("Unexpected response shape from GET {}: {}", path, err),
            )
        })
    }

    async fn ensure_success(&self, response: Response, label: &str) -> Result<Response, ToolError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text().await.unwrap_or_default();
        let preview = redact_text(
            &body,
            ERROR_BODY_PREVIEW_BYTES,
            &[self.config().secret.as_str()],
        );
        Err(ToolError::upstream(
            Some(status.as_u16()),
            format!(
                "{} failed with status {} {}",
                label,
                status.as_u16(),
                status_text
            )
            .trim_end()
            .to_string(),
        )
        .with_details(serde_json::json!({
            "status": status.as_u16(),
            "status_text": status_text,
            "body": preview,
        })))
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> ToolError {
        let message = if err.is_timeout() {
            "Upstream request timed out".to_string()
        } else {
            redact_text(
                &format!("Upstream request failed: {}", err),
                ERROR_BODY_PREVIEW_BYTES,
                &[self.config().secret.as_str()],
            )
        };
        ToolError::upstream(err.status().map(|s| s.as_u16()), message)
    }
}

/// Converts the built headers for sending. Multipart drops the declared
/// content type so the transport can supply one with its boundary.
fn to_header_map(config: &RequestConfig, multipart: bool) -> Result<HeaderMap, ToolError> {
    let mut map = HeaderMap::new();
    for (key, value) in &config.headers {
        if multipart && key.eq_ignore_ascii_case("content-type") {
            continue;
        }
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            ToolError::invalid_params(format!("Invalid header name '{}'", key))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ToolError::invalid_params(format!("Invalid value for header '{}'", key))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_context_maps_to_search_flag() {
        assert_eq!(AgentContext::parse("Knowledge"), Some(AgentContext::Knowledge));
        assert_eq!(AgentContext::parse("execute"), Some(AgentContext::Execute));
        assert_eq!(AgentContext::parse("other"), None);
        assert_eq!(AgentContext::Knowledge.query_flag(), "knowledgeAgent");
        assert_eq!(AgentContext::Execute.query_flag(), "executeAgent");
    }

    #[test]
    fn multipart_headers_leave_content_type_to_the_transport() {
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("Content-Type".to_string(), "multipart/form-data".to_string());
        headers.insert("x-pica-action-id".to_string(), "a1".to_string());
        let config = RequestConfig {
            url: "http://localhost/v1/passthrough/x".to_string(),
            method: "POST".to_string(),
            headers,
            params: None,
            data: None,
        };
        let map = to_header_map(&config, true).unwrap();
        assert!(map.get("content-type").is_none());
        assert_eq!(map.get("x-pica-action-id").unwrap(), "a1");
        assert!(to_header_map(&config, false).unwrap().get("content-type").is_some());
    }

    #[tokio::test]
    async fn client_starts_uninitialized_with_empty_caches() {
        let client = ApiClient::new(
            Arc::new(GatewayConfig::new("sk_test_123456")),
            &Logger::new("test"),
        )
        .unwrap();
        assert!(!client.is_initialized().await);
        assert!(client.user_connections().is_empty());
        assert!(client.available_connectors().is_empty());
    }
}
