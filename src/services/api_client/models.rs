use crate::constants::knowledge::{NO_KNOWLEDGE, NO_METHOD};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A caller's live, credentialed link to one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub key: String,
    pub platform: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A connectable platform from the upstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEntry {
    pub platform: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub oauth: bool,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PlatformEntry {
    pub fn is_eligible(&self) -> bool {
        self.active && !self.deprecated
    }
}

/// One catalogued upstream operation. Search results and knowledge records
/// both land here; `id` is the caller-facing action identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub title: String,
    pub method: String,
    pub path: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<String>,
}

impl Action {
    pub fn is_custom(&self) -> bool {
        self.tags.iter().any(|tag| tag == "custom")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionKnowledge {
    pub knowledge: String,
    pub method: String,
}

impl ActionKnowledge {
    pub fn from_action(action: &Action) -> Self {
        let knowledge = action
            .knowledge
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_KNOWLEDGE);
        let method = if action.method.trim().is_empty() {
            NO_METHOD.to_string()
        } else {
            action.method.to_uppercase()
        };
        Self {
            knowledge: knowledge.to_string(),
            method,
        }
    }
}

/// Row shape of the search endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRecord {
    system_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    method: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl From<SearchRecord> for Action {
    fn from(record: SearchRecord) -> Self {
        Action {
            id: record.system_id,
            title: record.title,
            method: record.method.to_uppercase(),
            path: record.path,
            tags: record.tags.unwrap_or_default(),
            knowledge: None,
        }
    }
}

/// Row shape of the knowledge endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct KnowledgeRecord {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    path: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    knowledge: Option<String>,
}

impl From<KnowledgeRecord> for Action {
    fn from(record: KnowledgeRecord) -> Self {
        Action {
            id: record.id,
            title: record.title,
            method: record.method.unwrap_or_default().to_uppercase(),
            path: record.path,
            tags: record.tags.unwrap_or_default(),
            knowledge: record.knowledge,
        }
    }
}

/// Listing endpoints answer either with a bare array or with a `rows` page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RowSet<T> {
    List(Vec<T>),
    Page { rows: Vec<T> },
}

impl<T> RowSet<T> {
    pub(crate) fn into_rows(self) -> Vec<T> {
        match self {
            RowSet::List(rows) | RowSet::Page { rows } => rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_and_knowledge_rows_share_one_id() {
        let search: SearchRecord = serde_json::from_value(json!({
            "systemId": "conn_mod_def::abc",
            "title": "List contacts",
            "method": "get",
            "path": "/contacts"
        }))
        .unwrap();
        let knowledge: KnowledgeRecord = serde_json::from_value(json!({
            "_id": "conn_mod_def::abc",
            "title": "List contacts",
            "method": "GET",
            "path": "/contacts",
            "knowledge": "Returns contacts."
        }))
        .unwrap();

        let from_search = Action::from(search);
        let from_knowledge = Action::from(knowledge);
        assert_eq!(from_search.id, from_knowledge.id);
        assert_eq!(from_search.method, "GET");
        assert!(from_search.tags.is_empty());
    }

    #[test]
    fn knowledge_projection_uses_placeholders() {
        let action = Action {
            id: "a1".to_string(),
            title: "Untitled".to_string(),
            method: String::new(),
            path: "/x".to_string(),
            tags: Vec::new(),
            knowledge: None,
        };
        let projected = ActionKnowledge::from_action(&action);
        assert_eq!(projected.knowledge, NO_KNOWLEDGE);
        assert_eq!(projected.method, NO_METHOD);
    }

    #[test]
    fn row_sets_accept_both_response_shapes() {
        let bare: RowSet<SearchRecord> =
            serde_json::from_value(json!([{ "systemId": "a1" }, { "systemId": "a2" }])).unwrap();
        let paged: RowSet<SearchRecord> =
            serde_json::from_value(json!({ "rows": [{ "systemId": "a1" }], "total": 1 })).unwrap();
        assert_eq!(bare.into_rows().len(), 2);
        assert_eq!(paged.into_rows().len(), 1);
    }

    #[test]
    fn connection_defaults_to_active_when_flag_is_absent() {
        let connection: Connection = serde_json::from_value(json!({
            "key": "live::slack::default::1",
            "platform": "slack",
            "environment": "live"
        }))
        .unwrap();
        assert!(connection.active);
        assert!(connection.tags.is_empty());
    }

    #[test]
    fn deprecated_platforms_are_not_eligible() {
        let entry: PlatformEntry = serde_json::from_value(json!({
            "platform": "legacy-crm",
            "name": "Legacy CRM",
            "active": true,
            "deprecated": true
        }))
        .unwrap();
        assert!(!entry.is_eligible());
    }
}
