//! Type definitions for parsed OpenAPI specs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether requests with this method carry a body
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter location in HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// A parameter for an API operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationParameter {
    /// Parameter name
    pub name: String,
    /// Where the parameter is located
    pub location: ParameterLocation,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter description
    pub description: Option<String>,
    /// JSON Schema for the parameter
    pub schema: Option<serde_json::Value>,
    /// Example value
    pub example: Option<serde_json::Value>,
}

impl OperationParameter {
    /// Example value for this parameter: the parameter's own example,
    /// else the schema example, else the schema default.
    pub fn example_value(&self) -> Option<&serde_json::Value> {
        self.example.as_ref().or_else(|| {
            self.schema
                .as_ref()
                .and_then(|s| s.get("example").or_else(|| s.get("default")))
        })
    }
}

/// Request body schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the body is required
    pub required: bool,
    /// Content type (e.g., "application/json")
    pub content_type: String,
    /// JSON Schema for the body, `$ref`s resolved
    pub schema: Option<serde_json::Value>,
    /// Description
    pub description: Option<String>,
}

/// Response schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// HTTP status code (or "default")
    pub status_code: String,
    /// Content type
    pub content_type: Option<String>,
    /// JSON Schema for the response, `$ref`s resolved
    pub schema: Option<serde_json::Value>,
    /// Description
    pub description: Option<String>,
}

/// A single API operation extracted from the spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiOperation {
    /// Operation ID (from spec or generated from method and path)
    pub operation_id: String,
    /// HTTP method
    pub method: HttpMethod,
    /// URL path (e.g., "/v1/chat/completions")
    pub path: String,
    /// Short summary
    pub summary: Option<String>,
    /// Full description
    pub description: Option<String>,
    /// Whether the operation is deprecated
    pub deprecated: bool,
    /// Parameters (path, query, header, cookie)
    pub parameters: Vec<OperationParameter>,
    /// Request body schema
    pub request_body: Option<RequestBody>,
    /// Responses in declaration order
    pub responses: Vec<ResponseSchema>,
    /// Security requirements for this operation
    pub security: Vec<SecurityRequirement>,
}

impl ApiOperation {
    /// The success response: `200` if declared, else `201`, else the first `2xx`.
    pub fn success_response(&self) -> Option<&ResponseSchema> {
        let find = |code: &str| self.responses.iter().find(|r| r.status_code == code);
        find("200")
            .or_else(|| find("201"))
            .or_else(|| self.responses.iter().find(|r| r.status_code.starts_with('2')))
    }

    /// Resolved JSON schema of the request body
    pub fn request_schema(&self) -> Option<&serde_json::Value> {
        self.request_body.as_ref().and_then(|b| b.schema.as_ref())
    }

    /// Resolved JSON schema of the success response
    pub fn response_schema(&self) -> Option<&serde_json::Value> {
        self.success_response().and_then(|r| r.schema.as_ref())
    }

    /// Header parameters marked as required
    pub fn required_headers(&self) -> impl Iterator<Item = &OperationParameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Header && p.required)
    }
}

/// Security requirement for an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRequirement {
    /// Name of the security scheme
    pub scheme_name: String,
    /// Required scopes (for OAuth2)
    pub scopes: Vec<String>,
}

/// Parsed OpenAPI specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSpec {
    /// API title
    pub title: String,
    /// API description
    pub description: Option<String>,
    /// API version
    pub version: String,
    /// Server URLs
    pub servers: Vec<ServerInfo>,
    /// All extracted operations, in declaration order
    pub operations: Vec<ApiOperation>,
    /// Security schemes defined in the spec, in declaration order
    pub security_schemes: IndexMap<String, SecurityScheme>,
    /// Global security requirements
    pub global_security: Vec<SecurityRequirement>,
}

impl ParsedSpec {
    /// Base URL from the first declared server, without a trailing slash
    pub fn base_url(&self) -> String {
        self.servers
            .first()
            .map(|s| s.url.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Provider identifier inferred from the title
    pub fn provider_name(&self) -> String {
        let title = self.title.to_lowercase();
        for known in ["openai", "anthropic", "cohere"] {
            if title.contains(known) {
                return known.to_string();
            }
        }
        title
            .split_whitespace()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// POST operations in declaration order
    pub fn post_operations(&self) -> impl Iterator<Item = &ApiOperation> {
        self.operations.iter().filter(|op| op.method == HttpMethod::Post)
    }
}

/// Server information from the spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server URL
    pub url: String,
    /// Server description
    pub description: Option<String>,
}

/// Security scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    /// API key authentication
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// HTTP authentication (bearer, basic)
    Http {
        scheme: String,
        bearer_format: Option<String>,
    },
    /// OAuth2 authentication (tokens are sent as bearer)
    OAuth2,
    /// OpenID Connect
    OpenIdConnect {
        openid_connect_url: String,
    },
}

/// API key location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

// --- Raw OpenAPI 3.x structures for parsing ---

/// Raw OpenAPI document structure
#[derive(Debug, Clone, Deserialize)]
pub struct RawOpenApiSpec {
    pub openapi: String,
    pub info: RawInfo,
    #[serde(default)]
    pub servers: Vec<RawServer>,
    #[serde(default)]
    pub paths: IndexMap<String, RawPathItem>,
    #[serde(default)]
    pub components: Option<RawComponents>,
    #[serde(default)]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInfo {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawServer {
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPathItem {
    pub get: Option<RawOperation>,
    pub post: Option<RawOperation>,
    pub put: Option<RawOperation>,
    pub patch: Option<RawOperation>,
    pub delete: Option<RawOperation>,
    pub head: Option<RawOperation>,
    pub options: Option<RawOperation>,
    pub trace: Option<RawOperation>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
    pub request_body: Option<RawRequestBody>,
    #[serde(default)]
    pub responses: IndexMap<String, RawResponse>,
    #[serde(default)]
    pub security: Option<Vec<IndexMap<String, Vec<String>>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameter {
    /// Parameter name (absent when $ref is used)
    #[serde(default)]
    pub name: String,
    /// Parameter location (absent when $ref is used)
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<serde_json::Value>,
    pub example: Option<serde_json::Value>,
    /// Reference to a parameter in components/parameters
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRequestBody {
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub content: IndexMap<String, RawMediaType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaType {
    pub schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<IndexMap<String, RawMediaType>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComponents {
    #[serde(default)]
    pub security_schemes: IndexMap<String, RawSecurityScheme>,
    #[serde(default)]
    pub schemas: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub parameters: IndexMap<String, RawParameter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub openid_connect_url: Option<String>,
}
