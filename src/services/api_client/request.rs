use super::models::Action;
use crate::constants::content_types;
use crate::constants::headers::{ACTION_ID, CONNECTION_KEY, CONTENT_TYPE, SECRET};
use crate::constants::upstream::PASSTHROUGH_PATH;
use crate::errors::ToolError;
use crate::services::config::GatewayConfig;
use crate::utils::form::{encode_form_urlencoded, form_fields, stringify_field};
use crate::utils::path_template::resolve_path;
use crate::utils::redact::sanitize_headers;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Caller input for a passthrough call.
#[derive(Debug, Clone, Default)]
pub struct PassthroughArgs {
    pub platform: String,
    pub action_id: String,
    pub connection_key: String,
    pub data: Option<Value>,
    pub path_variables: Map<String, Value>,
    pub query_params: Map<String, Value>,
    pub headers: Map<String, Value>,
    pub is_form_data: bool,
    pub is_form_url_encoded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    FormData,
    FormUrlEncoded,
}

impl BodyEncoding {
    /// `isFormData` wins when both flags are set.
    pub fn from_flags(is_form_data: bool, is_form_url_encoded: bool) -> Self {
        if is_form_data {
            BodyEncoding::FormData
        } else if is_form_url_encoded {
            BodyEncoding::FormUrlEncoded
        } else {
            BodyEncoding::Json
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            BodyEncoding::Json => content_types::JSON,
            BodyEncoding::FormData => content_types::FORM_DATA,
            BodyEncoding::FormUrlEncoded => content_types::FORM_URLENCODED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Json(Value),
    UrlEncoded(String),
    Multipart(BTreeMap<String, String>),
}

/// The fully assembled outbound call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestConfig {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RequestBody>,
}

impl RequestConfig {
    /// Copy safe to show callers: the secret header value is replaced, all
    /// other headers and the body are untouched.
    pub fn sanitized(&self) -> RequestConfig {
        RequestConfig {
            headers: sanitize_headers(&self.headers),
            ..self.clone()
        }
    }
}

pub fn build_request_config(
    config: &GatewayConfig,
    action: &Action,
    args: &PassthroughArgs,
) -> Result<RequestConfig, ToolError> {
    let method = action.method.trim().to_uppercase();
    if method.is_empty() {
        return Err(ToolError::upstream(
            None,
            format!("Action '{}' has no HTTP method", action.id),
        ));
    }
    let encoding = BodyEncoding::from_flags(args.is_form_data, args.is_form_url_encoded);

    let mut path = resolve_path(&action.path, &args.path_variables)?;
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    let url = format!("{}{}{}", config.base_url, PASSTHROUGH_PATH, path);

    let mut headers = BTreeMap::new();
    headers.insert(SECRET.to_string(), config.secret.clone());
    headers.insert(CONNECTION_KEY.to_string(), args.connection_key.clone());
    headers.insert(ACTION_ID.to_string(), action.id.clone());
    headers.insert(CONTENT_TYPE.to_string(), encoding.content_type().to_string());
    for (key, value) in args.headers.iter() {
        let name = key.trim();
        if name.is_empty() || value.is_null() {
            continue;
        }
        set_header(&mut headers, name, stringify_field(value));
    }
    // Caller headers are applied last; gateway headers are re-asserted after them.
    set_header(&mut headers, SECRET, config.secret.clone());
    set_header(&mut headers, CONNECTION_KEY, args.connection_key.clone());
    set_header(&mut headers, ACTION_ID, action.id.clone());

    let data = if method == "GET" {
        None
    } else {
        let mut body = args.data.clone();
        if action.is_custom() {
            body = Some(inject_connection_key(body, &args.connection_key));
        }
        match body {
            None | Some(Value::Null) => None,
            Some(body) => Some(encode_body(encoding, body)?),
        }
    };

    let params = if args.query_params.is_empty() {
        None
    } else {
        Some(
            args.query_params
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), stringify_field(value)))
                .collect(),
        )
    };

    Ok(RequestConfig {
        url,
        method,
        headers,
        params,
        data,
    })
}

/// Inserts `name`, replacing any existing header that differs only by case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// Merges the connection key into an object body. Non-object bodies cannot
/// carry the field and are left as they are.
fn inject_connection_key(body: Option<Value>, connection_key: &str) -> Value {
    match body {
        None | Some(Value::Null) => serde_json::json!({ "connectionKey": connection_key }),
        Some(Value::Object(mut map)) => {
            map.insert(
                "connectionKey".to_string(),
                Value::String(connection_key.to_string()),
            );
            Value::Object(map)
        }
        Some(other) => other,
    }
}

fn encode_body(encoding: BodyEncoding, body: Value) -> Result<RequestBody, ToolError> {
    match encoding {
        BodyEncoding::Json => Ok(RequestBody::Json(body)),
        BodyEncoding::FormUrlEncoded => encode_form_urlencoded(&body).map(RequestBody::UrlEncoded),
        BodyEncoding::FormData => Ok(RequestBody::Multipart(
            form_fields(&body)?.into_iter().collect(),
        )),
    }
}
