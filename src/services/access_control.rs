//! Stateless authorization predicates evaluated against the startup config.
//!
//! Handlers check the action allowlist before any network call, then the
//! connection-key allowlist, and only after the action details are known
//! the permission level against the action's HTTP method.

use crate::errors::ToolError;
use crate::services::api_client::Action;
use crate::services::config::{AllowList, GatewayConfig, PermissionLevel};

const READ_METHODS: &[&str] = &["GET"];
const WRITE_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH"];

/// Methods a level may use; `None` means unrestricted.
pub fn allowed_methods(level: PermissionLevel) -> Option<&'static [&'static str]> {
    match level {
        PermissionLevel::Read => Some(READ_METHODS),
        PermissionLevel::Write => Some(WRITE_METHODS),
        PermissionLevel::Admin => None,
    }
}

pub fn is_method_allowed(method: &str, level: PermissionLevel) -> bool {
    match allowed_methods(level) {
        None => true,
        Some(methods) => methods
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(method.trim())),
    }
}

pub fn filter_by_permissions(actions: Vec<Action>, level: PermissionLevel) -> Vec<Action> {
    actions
        .into_iter()
        .filter(|action| is_method_allowed(&action.method, level))
        .collect()
}

pub fn is_action_allowed(action_id: &str, allowlist: &AllowList) -> bool {
    allowlist.allows(action_id)
}

pub fn is_connection_key_allowed(connection_key: &str, allowlist: &AllowList) -> bool {
    allowlist.allows(connection_key)
}

/// Permission and allowlist filtering applied to anything offered to agents.
pub fn visible_actions(actions: Vec<Action>, config: &GatewayConfig) -> Vec<Action> {
    filter_by_permissions(actions, config.permission_level)
        .into_iter()
        .filter(|action| is_action_allowed(&action.id, &config.action_ids))
        .collect()
}

pub fn ensure_action_allowed(action_id: &str, config: &GatewayConfig) -> Result<(), ToolError> {
    if is_action_allowed(action_id, &config.action_ids) {
        return Ok(());
    }
    Err(
        ToolError::denied(format!("Action '{}' is not in the allowed action list", action_id))
            .with_hint("Pick an action returned by search_pica_platform_actions, or ask an operator to extend PICA_ACTION_IDS"),
    )
}

pub fn ensure_connection_allowed(
    connection_key: &str,
    config: &GatewayConfig,
) -> Result<(), ToolError> {
    if is_connection_key_allowed(connection_key, &config.connection_keys) {
        return Ok(());
    }
    Err(ToolError::denied(format!(
        "Connection key '{}' is not in the allowed connection list",
        connection_key
    ))
    .with_hint("Use a connection key returned by list_pica_integrations"))
}

pub fn ensure_method_allowed(method: &str, level: PermissionLevel) -> Result<(), ToolError> {
    if is_method_allowed(method, level) {
        return Ok(());
    }
    let allowed = allowed_methods(level)
        .map(|methods| methods.join(", "))
        .unwrap_or_default();
    Err(ToolError::denied(format!(
        "Method {} is not permitted at permission level '{}'",
        method.to_uppercase(),
        level.as_str()
    ))
    .with_hint(format!("Allowed methods: {}", allowed))
    .with_details(serde_json::json!({
        "method": method.to_uppercase(),
        "permission_level": level,
    })))
}
