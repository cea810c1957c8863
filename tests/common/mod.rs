#![allow(dead_code)]

use once_cell::sync::Lazy;
use pica_mcp::mcp::server::McpServer;
use pica_mcp::services::config::GatewayConfig;
use serde_json::Value;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const SECRET: &str = "sk_test_integration_secret";

pub fn config_for(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        base_url: server.uri(),
        ..GatewayConfig::new(SECRET)
    }
}

pub fn page(rows: Value, total: usize) -> Value {
    serde_json::json!({ "rows": rows, "total": total })
}

pub fn connection_rows(range: std::ops::Range<usize>) -> Value {
    Value::Array(
        range
            .map(|i| serde_json::json!({ "key": format!("live::slack::default::{}", i), "platform": "slack" }))
            .collect(),
    )
}

/// Both cache listings answer with a single empty page.
pub async fn mount_empty_caches(server: &MockServer) {
    for endpoint in ["/v1/vault/connections", "/v1/available-connectors"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(serde_json::json!([]), 0)))
            .mount(server)
            .await;
    }
}

pub fn knowledge_row(id: &str, method: &str, path: &str, tags: &[&str]) -> Value {
    serde_json::json!({
        "_id": id,
        "title": format!("{} {}", method, path),
        "method": method,
        "path": path,
        "tags": tags,
        "knowledge": "Documented upstream."
    })
}

/// Sends a `tools/call` and returns the parsed JSON-RPC response.
pub async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments },
    });
    let reply = server
        .handle_line(&request.to_string())
        .await
        .expect("tools/call must be answered");
    serde_json::from_str(&reply).expect("response must be JSON")
}

/// The handler result inside a successful tool response envelope.
pub fn tool_result(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("expected a successful tool response, got {}", response));
    let envelope: Value = serde_json::from_str(text).expect("envelope must be JSON");
    envelope["result"].clone()
}
