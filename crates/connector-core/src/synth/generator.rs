//! Assemble a `ConnectorConfig` from a parsed OpenAPI spec

use indexmap::IndexMap;
use openapi_parser::{ApiKeyLocation, AuthScheme, HttpMethod, ParsedSpec};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::mapping::{find_prompt_field, find_reply_path};
use super::scorer::{rank_candidates, EndpointCandidate};
use crate::config::{
    AuthConfig, ConnectorConfig, RequestMapping, ResponseMapping, CREDENTIAL_PLACEHOLDER,
};
use crate::error::SynthesisError;

/// Default `max_tokens` when the request schema requires one
pub const DEFAULT_MAX_TOKENS: u64 = 1024;

/// Error message path most providers share
pub const DEFAULT_ERROR_FIELD: &str = "error.message";

/// Map a detected auth scheme onto the config's auth block
pub fn auth_config(scheme: &AuthScheme) -> AuthConfig {
    match scheme.primary() {
        AuthScheme::None | AuthScheme::Multiple(_) => AuthConfig::none(),
        AuthScheme::Bearer { .. } => AuthConfig::header("Authorization", "Bearer {credential}"),
        AuthScheme::Basic => AuthConfig::header("Authorization", "Basic {credential}"),
        AuthScheme::ApiKey { name, location } => match location {
            ApiKeyLocation::Header => AuthConfig::header(name.clone(), CREDENTIAL_PLACEHOLDER),
            ApiKeyLocation::Query => AuthConfig::query(name.clone()),
            ApiKeyLocation::Cookie => {
                AuthConfig::header("Cookie", format!("{}={}", name, CREDENTIAL_PLACEHOLDER))
            }
        },
    }
}

/// Generates a `ConnectorConfig` from a parsed spec
pub struct ConfigGenerator<'a> {
    spec: &'a ParsedSpec,
}

impl<'a> ConfigGenerator<'a> {
    pub fn new(spec: &'a ParsedSpec) -> Self {
        Self { spec }
    }

    /// Ranked chat endpoint candidates, best first
    pub fn candidates(&self) -> Vec<EndpointCandidate<'a>> {
        rank_candidates(self.spec)
    }

    pub fn auth(&self) -> AuthConfig {
        auth_config(&AuthScheme::detect(
            &self.spec.security_schemes,
            &self.spec.global_security,
        ))
    }

    /// Generate the config. `model_hint` overrides any model found in the schema.
    pub fn generate(&self, model_hint: Option<&str>) -> Result<ConnectorConfig, SynthesisError> {
        let best = self
            .candidates()
            .into_iter()
            .next()
            .ok_or(SynthesisError::NoChatEndpoint)?;

        info!("Selected chat endpoint [{:.1}] POST {}", best.score, best.path());

        let endpoint = best.path().to_string();

        let prompt = best
            .request_schema()
            .and_then(find_prompt_field)
            .ok_or_else(|| SynthesisError::NoPromptField {
                endpoint: endpoint.clone(),
            })?;

        let response_field = best
            .response_schema()
            .and_then(find_reply_path)
            .ok_or_else(|| SynthesisError::NoResponseField {
                endpoint: endpoint.clone(),
            })?;

        debug!(
            "Prompt field '{}', reply path '{}'",
            prompt.prompt_field, response_field
        );

        let auth = self.auth();
        let static_fields = Self::static_fields(prompt.template, best.request_schema(), model_hint);
        let extra_headers = Self::extra_headers(&best, &auth);

        Ok(ConnectorConfig {
            name: if self.spec.title.is_empty() {
                "Unknown API".to_string()
            } else {
                self.spec.title.clone()
            },
            provider: self.spec.provider_name(),
            version: "1.0".to_string(),
            base_url: self.spec.base_url(),
            auth: Some(auth),
            request: RequestMapping {
                endpoint,
                method: HttpMethod::Post,
                prompt_field: prompt.prompt_field,
                static_fields,
                content_type: "application/json".to_string(),
                extra_headers,
            },
            response: ResponseMapping {
                response_field,
                error_field: Some(DEFAULT_ERROR_FIELD.to_string()),
            },
            streaming: false,
            timeout_seconds: 30,
        })
    }

    /// Prompt template, then `model`, then `max_tokens` when required
    fn static_fields(
        template: Map<String, Value>,
        request_schema: Option<&Value>,
        model_hint: Option<&str>,
    ) -> Map<String, Value> {
        let mut fields = template;

        let model = match model_hint {
            Some(hint) => Some(Value::String(hint.to_string())),
            None => request_schema
                .and_then(|s| s.pointer("/properties/model"))
                .and_then(|m| m.get("example").or_else(|| m.get("default")))
                .cloned(),
        };
        if let Some(model) = model {
            fields.insert("model".to_string(), model);
        }

        let max_tokens_required = request_schema
            .and_then(|s| s.get("required"))
            .and_then(Value::as_array)
            .map(|required| required.iter().any(|r| r == "max_tokens"))
            .unwrap_or(false);
        if max_tokens_required {
            fields.insert("max_tokens".to_string(), json!(DEFAULT_MAX_TOKENS));
        }

        fields
    }

    /// Required header parameters that carry an example, minus the auth header
    fn extra_headers(candidate: &EndpointCandidate<'_>, auth: &AuthConfig) -> IndexMap<String, String> {
        candidate
            .required_headers()
            .filter(|p| auth.is_none() || !p.name.eq_ignore_ascii_case(&auth.key_name))
            .filter_map(|p| {
                let value = match p.example_value()? {
                    Value::String(s) if !s.is_empty() => s.clone(),
                    Value::String(_) | Value::Null => return None,
                    other => other.to_string(),
                };
                Some((p.name.clone(), value))
            })
            .collect()
    }
}
