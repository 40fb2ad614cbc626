//! Connector configuration: the declarative description of one chat API.
//!
//! A `ConnectorConfig` is all the runtime needs to talk to a provider. It
//! holds no code and no secrets; credentials are injected at call time
//! through `{credential}` in the auth value template.

use indexmap::IndexMap;
use openapi_parser::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::error::{ConnectorError, Result};

/// Placeholder replaced by the user's prompt in `static_fields`
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Placeholder replaced by the credential in `AuthConfig::value_template`
pub const CREDENTIAL_PLACEHOLDER: &str = "{credential}";

/// Where the credential is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLocation {
    Header,
    Query,
    Body,
    None,
}

/// Authentication configuration for API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub location: AuthLocation,
    /// Header name, query parameter, or body dot-path
    #[serde(default)]
    pub key_name: String,
    /// e.g. "Bearer {credential}" or "{credential}"
    #[serde(default)]
    pub value_template: String,
}

impl AuthConfig {
    pub fn none() -> Self {
        Self {
            location: AuthLocation::None,
            key_name: String::new(),
            value_template: String::new(),
        }
    }

    pub fn header(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            location: AuthLocation::Header,
            key_name: name.into(),
            value_template: template.into(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self {
            location: AuthLocation::Query,
            key_name: name.into(),
            value_template: CREDENTIAL_PLACEHOLDER.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.location == AuthLocation::None
    }

    /// Render the value template with the given credential
    pub fn render(&self, credential: &str) -> String {
        self.value_template.replace(CREDENTIAL_PLACEHOLDER, credential)
    }
}

fn default_method() -> HttpMethod {
    HttpMethod::Post
}

fn default_prompt_field() -> String {
    "prompt".to_string()
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Maps the unified prompt interface onto the API's request format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMapping {
    /// Path appended to `base_url` (e.g. "/v1/chat/completions")
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: HttpMethod,
    /// Dot-path where the prompt goes when `static_fields` has no `{prompt}`
    #[serde(default = "default_prompt_field")]
    pub prompt_field: String,
    /// Fields included in every request body
    #[serde(default)]
    pub static_fields: Map<String, Value>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Extra headers some APIs require (e.g. anthropic-version)
    #[serde(default)]
    pub extra_headers: IndexMap<String, String>,
}

impl RequestMapping {
    /// Whether any string inside `static_fields` carries the prompt placeholder
    pub fn has_prompt_placeholder(&self) -> bool {
        fn contains(value: &Value) -> bool {
            match value {
                Value::String(s) => s.contains(PROMPT_PLACEHOLDER),
                Value::Array(items) => items.iter().any(contains),
                Value::Object(map) => map.values().any(contains),
                _ => false,
            }
        }
        self.static_fields.values().any(contains)
    }
}

fn default_response_field() -> String {
    "response".to_string()
}

/// Maps the API's response format onto the unified reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMapping {
    /// Dot-path to the reply text (e.g. "choices.0.message.content")
    #[serde(default = "default_response_field")]
    pub response_field: String,
    /// Dot-path to the error message in error bodies
    #[serde(default)]
    pub error_field: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Complete configuration for connecting to an AI API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Human-readable name (e.g. "OpenAI API")
    pub name: String,
    /// Provider identifier (e.g. "openai"); also names the credential env var
    pub provider: String,
    /// Config schema version
    #[serde(default = "default_version")]
    pub version: String,
    /// API base URL (e.g. "https://api.openai.com/v1")
    pub base_url: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    pub request: RequestMapping,
    pub response: ResponseMapping,
    /// Reserved; streaming calls are not implemented
    #[serde(default)]
    pub streaming: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ConnectorConfig {
    /// Full request URL: base URL without trailing slash, then the endpoint
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.request.endpoint)
    }

    /// Effective auth; a missing auth block means no auth
    pub fn auth(&self) -> AuthConfig {
        self.auth.clone().unwrap_or_else(AuthConfig::none)
    }

    /// Check the fields the runtime depends on
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ConnectorError::InvalidConfig("base_url is empty".to_string()));
        }
        if self.request.endpoint.is_empty() {
            return Err(ConnectorError::InvalidConfig("request.endpoint is empty".to_string()));
        }
        if self.response.response_field.is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "response.response_field is empty".to_string(),
            ));
        }
        if let Some(auth) = &self.auth {
            if !auth.is_none() && auth.key_name.is_empty() {
                return Err(ConnectorError::InvalidConfig("auth.key_name is empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded connector config '{}' from {:?}", config.name, path);
        Ok(config)
    }

    /// Save config as pretty-printed JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        debug!("Saved connector config '{}' to {:?}", self.name, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OPENAI_CONFIG: &str = r#"{
        "name": "OpenAI GPT-3.5 Turbo",
        "provider": "openai",
        "base_url": "https://api.openai.com",
        "auth": {"type": "header", "key_name": "Authorization", "value_template": "Bearer {credential}"},
        "request": {
            "endpoint": "/v1/chat/completions",
            "prompt_field": "messages",
            "static_fields": {
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "{prompt}"}]
            }
        },
        "response": {"response_field": "choices.0.message.content", "error_field": "error.message"}
    }"#;

    #[test]
    fn test_load_with_defaults() {
        let config = ConnectorConfig::from_json(OPENAI_CONFIG).unwrap();

        assert_eq!(config.provider, "openai");
        assert_eq!(config.version, "1.0");
        assert_eq!(config.request.method, HttpMethod::Post);
        assert_eq!(config.request.content_type, "application/json");
        assert!(config.request.extra_headers.is_empty());
        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.streaming);
        assert_eq!(config.endpoint_url(), "https://api.openai.com/v1/chat/completions");
        assert!(config.request.has_prompt_placeholder());
    }

    #[test]
    fn test_null_auth_means_none() {
        let mut value: Value = serde_json::from_str(OPENAI_CONFIG).unwrap();
        value["auth"] = Value::Null;
        let config = ConnectorConfig::from_json(&value.to_string()).unwrap();
        assert!(config.auth().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let config = ConnectorConfig::from_json(OPENAI_CONFIG).unwrap();
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["auth"]["type"], "header");
        assert_eq!(value["request"]["method"], "POST");
        assert_eq!(
            value["request"]["static_fields"],
            json!({"model": "gpt-3.5-turbo", "messages": [{"role": "user", "content": "{prompt}"}]})
        );
        assert_eq!(value["response"]["response_field"], "choices.0.message.content");
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut value: Value = serde_json::from_str(OPENAI_CONFIG).unwrap();
        value["request"]["endpoint"] = json!("");
        let err = ConnectorConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfig(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openai.json");

        let config = ConnectorConfig::from_json(OPENAI_CONFIG).unwrap();
        config.to_json_file(&path).unwrap();

        assert_eq!(ConnectorConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_render_auth_template() {
        let auth = AuthConfig::header("Authorization", "Bearer {credential}");
        assert_eq!(auth.render("sk-test"), "Bearer sk-test");
        assert_eq!(AuthConfig::query("key").render("abc"), "abc");
    }
}
