mod common;
use common::ENV_LOCK;

use pica_mcp::services::config::{
    AllowList, ConfigError, GatewayConfig, PermissionLevel, ENV_ACTION_IDS, ENV_BASE_URL,
    ENV_CONNECTION_KEYS, ENV_IDENTITY, ENV_IDENTITY_TYPE, ENV_KNOWLEDGE_AGENT, ENV_PERMISSIONS,
    ENV_SECRET,
};

const ALL_VARS: &[&str] = &[
    ENV_SECRET,
    ENV_BASE_URL,
    ENV_IDENTITY,
    ENV_IDENTITY_TYPE,
    ENV_PERMISSIONS,
    ENV_CONNECTION_KEYS,
    ENV_ACTION_IDS,
    ENV_KNOWLEDGE_AGENT,
];

fn snapshot() -> Vec<(&'static str, Option<String>)> {
    ALL_VARS
        .iter()
        .map(|key| (*key, std::env::var(key).ok()))
        .collect()
}

fn restore(previous: Vec<(&'static str, Option<String>)>) {
    for (key, value) in previous {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

fn clear() {
    for key in ALL_VARS {
        std::env::remove_var(key);
    }
}

#[tokio::test]
async fn config_is_read_from_the_process_environment() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    std::env::set_var(ENV_SECRET, "sk_test_env_secret");
    std::env::set_var(ENV_PERMISSIONS, "READ");
    std::env::set_var(ENV_ACTION_IDS, "a1,a2");
    std::env::set_var(ENV_KNOWLEDGE_AGENT, "1");
    let config = GatewayConfig::from_env();

    restore(previous);

    let config = config.expect("config must load");
    assert_eq!(config.permission_level, PermissionLevel::Read);
    assert_eq!(
        config.action_ids,
        AllowList::Only(vec!["a1".to_string(), "a2".to_string()])
    );
    assert!(config.connection_keys.is_wildcard());
    assert!(config.knowledge_only);
}

#[tokio::test]
async fn missing_secret_stops_startup() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    let result = GatewayConfig::from_env();

    restore(previous);

    assert!(matches!(result, Err(ConfigError::MissingSecret)));
}

#[tokio::test]
async fn non_http_base_url_is_rejected() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    clear();

    std::env::set_var(ENV_SECRET, "sk_test_env_secret");
    std::env::set_var(ENV_BASE_URL, "ftp://example.test");
    let result = GatewayConfig::from_env();

    restore(previous);

    assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(_))));
}
