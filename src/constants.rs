pub mod upstream {
    pub const DEFAULT_BASE_URL: &str = "https://api.picaos.com";
    pub const CONNECTIONS_PATH: &str = "/v1/vault/connections";
    pub const CONNECTORS_PATH: &str = "/v1/available-connectors";
    pub const SEARCH_PATH: &str = "/v1/available-actions/search";
    pub const KNOWLEDGE_PATH: &str = "/v1/knowledge";
    pub const PASSTHROUGH_PATH: &str = "/v1/passthrough";
    pub const USER_AGENT: &str = concat!("pica-mcp/", env!("CARGO_PKG_VERSION"));
}

pub mod headers {
    pub const SECRET: &str = "x-pica-secret";
    pub const CONNECTION_KEY: &str = "x-pica-connection-key";
    pub const ACTION_ID: &str = "x-pica-action-id";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const REDACTED_SECRET: &str = "****REDACTED****";
}

pub mod content_types {
    pub const JSON: &str = "application/json";
    pub const FORM_DATA: &str = "multipart/form-data";
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
}

pub mod pagination {
    pub const PAGE_SIZE: usize = 100;
}

pub mod search {
    pub const RESULT_LIMIT: usize = 5;
}

pub mod knowledge {
    pub const NO_KNOWLEDGE: &str = "No knowledge was found";
    pub const NO_METHOD: &str = "No method was found";
}

pub mod limits {
    pub const ERROR_BODY_PREVIEW_BYTES: usize = 2_048;
}

pub mod tools {
    pub const LIST_INTEGRATIONS: &str = "list_pica_integrations";
    pub const SEARCH_ACTIONS: &str = "search_pica_platform_actions";
    pub const ACTION_KNOWLEDGE: &str = "get_pica_action_knowledge";
    pub const EXECUTE_ACTION: &str = "execute_pica_action";
}
