//! Main OpenAPI parser

use crate::error::{ParseError, ParseResult};
use crate::operations::OperationExtractor;
use crate::types::*;
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// OpenAPI 3.x parser
pub struct OpenApiParser;

impl OpenApiParser {
    /// Parse an OpenAPI spec from a string (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> ParseResult<ParsedSpec> {
        if content.trim_start().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    /// Parse an OpenAPI spec from JSON
    pub fn parse_json(content: &str) -> ParseResult<ParsedSpec> {
        let content = Self::sanitize_large_numbers(content);
        let raw_spec: RawOpenApiSpec = serde_json::from_str(&content)?;
        Self::convert_spec(raw_spec)
    }

    /// Parse an OpenAPI spec from YAML
    pub fn parse_yaml(content: &str) -> ParseResult<ParsedSpec> {
        let content = Self::sanitize_large_numbers(content);
        let raw_spec: RawOpenApiSpec = serde_yaml::from_str(&content)?;
        Self::convert_spec(raw_spec)
    }

    /// Read and parse a spec file; `.json` files are parsed as JSON, anything
    /// else goes through auto-detection
    pub fn parse_file(path: impl AsRef<Path>) -> ParseResult<ParsedSpec> {
        let path = path.as_ref();
        debug!("Reading OpenAPI spec from {:?}", path);
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse(&content),
        }
    }

    /// Clamp integers too large for serde's number types.
    ///
    /// Some specs (OpenAI's among them) use 64-bit bounds for min/max
    /// constraints; only the key names below are rewritten.
    fn sanitize_large_numbers(content: &str) -> String {
        static LARGE_BOUND: OnceLock<Regex> = OnceLock::new();
        let re = LARGE_BOUND.get_or_init(|| {
            Regex::new(
                r#"(?m)^(\s*"?(?:minimum|maximum|exclusiveMinimum|exclusiveMaximum)"?\s*:\s*)(-?\d{16,})"#,
            )
            .expect("bound pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            if caps[2].starts_with('-') {
                format!("{}-2147483648", &caps[1])
            } else {
                format!("{}2147483647", &caps[1])
            }
        })
        .into_owned()
    }

    /// Fetch and parse an OpenAPI spec from a URL
    pub async fn fetch_and_parse(url: &str) -> ParseResult<ParsedSpec> {
        info!("Fetching OpenAPI spec from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ParseError::HttpError(e.to_string()))?;

        let response = client
            .get(url)
            .header("Accept", "application/json, application/yaml, text/yaml")
            .send()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParseError::FetchError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let content = response
            .text()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        if content_type.contains("yaml") || url.ends_with(".yaml") || url.ends_with(".yml") {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Load a spec from a local path or an http(s) URL
    pub async fn load(location: &str) -> ParseResult<ParsedSpec> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::fetch_and_parse(location).await
        } else {
            Self::parse_file(location)
        }
    }

    /// Convert a raw OpenAPI spec to our internal format
    fn convert_spec(raw: RawOpenApiSpec) -> ParseResult<ParsedSpec> {
        if !raw.openapi.starts_with("3.") {
            return Err(ParseError::UnsupportedVersion(raw.openapi));
        }
        if raw.paths.is_empty() {
            debug!("Spec '{}' declares no paths", raw.info.title);
        }

        debug!("Parsing OpenAPI {} spec: {}", raw.openapi, raw.info.title);

        let operations = OperationExtractor::extract(&raw)?;

        debug!("Extracted {} operations", operations.len());

        let security_schemes = raw
            .components
            .as_ref()
            .map(|c| Self::convert_security_schemes(&c.security_schemes))
            .unwrap_or_default();

        let global_security = raw
            .security
            .iter()
            .flat_map(|req| {
                req.iter().map(|(name, scopes)| SecurityRequirement {
                    scheme_name: name.clone(),
                    scopes: scopes.clone(),
                })
            })
            .collect();

        let servers = raw
            .servers
            .iter()
            .map(|s| ServerInfo {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect();

        Ok(ParsedSpec {
            title: raw.info.title,
            description: raw.info.description,
            version: raw.info.version,
            servers,
            operations,
            security_schemes,
            global_security,
        })
    }

    fn convert_security_schemes(
        raw: &IndexMap<String, RawSecurityScheme>,
    ) -> IndexMap<String, SecurityScheme> {
        raw.iter()
            .filter_map(|(name, scheme)| {
                Self::convert_security_scheme(scheme).map(|s| (name.clone(), s))
            })
            .collect()
    }

    fn convert_security_scheme(raw: &RawSecurityScheme) -> Option<SecurityScheme> {
        match raw.scheme_type.as_str() {
            "apiKey" => Some(SecurityScheme::ApiKey {
                name: raw.name.clone().unwrap_or_default(),
                location: match raw.location.as_deref() {
                    Some("query") => ApiKeyLocation::Query,
                    Some("cookie") => ApiKeyLocation::Cookie,
                    _ => ApiKeyLocation::Header,
                },
            }),
            "http" => Some(SecurityScheme::Http {
                scheme: raw.scheme.clone().unwrap_or_else(|| "bearer".to_string()),
                bearer_format: raw.bearer_format.clone(),
            }),
            "oauth2" => Some(SecurityScheme::OAuth2),
            "openIdConnect" => Some(SecurityScheme::OpenIdConnect {
                openid_connect_url: raw.openid_connect_url.clone().unwrap_or_default(),
            }),
            other => {
                debug!("Ignoring unsupported security scheme type '{}'", other);
                None
            }
        }
    }
}
