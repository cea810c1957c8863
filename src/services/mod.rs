pub mod access_control;
pub mod api_client;
pub mod config;
pub mod logger;
pub mod pagination;
pub mod tool_executor;
pub mod validation;
