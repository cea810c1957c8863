use crate::constants::upstream::DEFAULT_BASE_URL;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const ENV_SECRET: &str = "PICA_SECRET";
pub const ENV_BASE_URL: &str = "PICA_BASE_URL";
pub const ENV_IDENTITY: &str = "PICA_IDENTITY";
pub const ENV_IDENTITY_TYPE: &str = "PICA_IDENTITY_TYPE";
pub const ENV_PERMISSIONS: &str = "PICA_PERMISSIONS";
pub const ENV_CONNECTION_KEYS: &str = "PICA_CONNECTION_KEYS";
pub const ENV_ACTION_IDS: &str = "PICA_ACTION_IDS";
pub const ENV_KNOWLEDGE_AGENT: &str = "PICA_KNOWLEDGE_AGENT";

const WILDCARD: &str = "*";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PICA_SECRET is required")]
    MissingSecret,
    #[error("PICA_PERMISSIONS must be one of read, write, admin (got '{0}')")]
    InvalidPermissionLevel(String),
    #[error("PICA_BASE_URL must be an http(s) URL (got '{0}')")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "read" => Ok(PermissionLevel::Read),
            "write" => Ok(PermissionLevel::Write),
            "admin" => Ok(PermissionLevel::Admin),
            _ => Err(ConfigError::InvalidPermissionLevel(raw.to_string())),
        }
    }
}

/// A set of permitted identifiers, or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    Any,
    Only(Vec<String>),
}

impl AllowList {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items = Vec::new();
        for entry in entries {
            let entry: String = entry.into();
            let trimmed = entry.trim();
            if trimmed == WILDCARD {
                return AllowList::Any;
            }
            if !trimmed.is_empty() {
                items.push(trimmed.to_string());
            }
        }
        AllowList::Only(items)
    }

    /// Parses a comma-separated list. An unset value means unrestricted; a
    /// set-but-blank value permits nothing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => AllowList::Any,
            Some(text) => AllowList::from_entries(text.split(',')),
        }
    }

    pub fn allows(&self, id: &str) -> bool {
        match self {
            AllowList::Any => true,
            AllowList::Only(items) => items.iter().any(|item| item == id),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, AllowList::Any)
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowList::Any => write!(f, "{}", WILDCARD),
            AllowList::Only(items) => write!(f, "{}", items.join(",")),
        }
    }
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Clone)]
pub struct GatewayConfig {
    pub secret: String,
    pub base_url: String,
    pub identity: Option<String>,
    pub identity_type: Option<String>,
    pub permission_level: PermissionLevel,
    pub connection_keys: AllowList,
    pub action_ids: AllowList,
    pub knowledge_only: bool,
}

impl GatewayConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            identity: None,
            identity_type: None,
            permission_level: PermissionLevel::Admin,
            connection_keys: AllowList::Any,
            action_ids: AllowList::Any,
            knowledge_only: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_SECRET)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let base_url = match non_blank(lookup(ENV_BASE_URL)) {
            Some(raw) => normalize_base_url(&raw)?,
            None => DEFAULT_BASE_URL.to_string(),
        };

        let permission_level = match non_blank(lookup(ENV_PERMISSIONS)) {
            Some(raw) => raw.parse()?,
            None => PermissionLevel::Admin,
        };

        Ok(Self {
            secret,
            base_url,
            identity: non_blank(lookup(ENV_IDENTITY)),
            identity_type: non_blank(lookup(ENV_IDENTITY_TYPE)),
            permission_level,
            connection_keys: AllowList::parse(lookup(ENV_CONNECTION_KEYS).as_deref()),
            action_ids: AllowList::parse(lookup(ENV_ACTION_IDS).as_deref()),
            knowledge_only: lookup(ENV_KNOWLEDGE_AGENT)
                .map(is_truthy)
                .unwrap_or(false),
        })
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "base_url": self.base_url,
            "permission_level": self.permission_level,
            "connection_keys": self.connection_keys.to_string(),
            "action_ids": self.action_ids.to_string(),
            "identity_scoped": self.identity.is_some(),
            "knowledge_only": self.knowledge_only,
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("identity_type", &self.identity_type)
            .field("permission_level", &self.permission_level)
            .field("connection_keys", &self.connection_keys)
            .field("action_ids", &self.action_ids)
            .field("knowledge_only", &self.knowledge_only)
            .finish()
    }
}

pub fn is_truthy(value: impl AsRef<str>) -> bool {
    matches!(
        value.as_ref().trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
