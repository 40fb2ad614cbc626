//! Authentication scheme detection

use crate::types::*;
use indexmap::IndexMap;

/// Detected authentication scheme for an API
#[derive(Debug, Clone, PartialEq)]
pub enum AuthScheme {
    /// No authentication required
    None,
    /// Bearer token (Authorization: Bearer <token>)
    Bearer { format: Option<String> },
    /// API key in header, query, or cookie
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    /// Basic authentication
    Basic,
    /// Multiple auth schemes (any of), in declaration order
    Multiple(Vec<AuthScheme>),
}

impl AuthScheme {
    /// Detect the authentication scheme from security schemes.
    ///
    /// Required schemes are taken in requirement order; without requirements
    /// the first declared scheme is used.
    pub fn detect(
        security_schemes: &IndexMap<String, SecurityScheme>,
        security_requirements: &[SecurityRequirement],
    ) -> Self {
        if security_requirements.is_empty() {
            return security_schemes
                .values()
                .next()
                .map(Self::from_scheme)
                .unwrap_or(AuthScheme::None);
        }

        let mut schemes: Vec<AuthScheme> = security_requirements
            .iter()
            .filter_map(|req| security_schemes.get(&req.scheme_name))
            .map(Self::from_scheme)
            .collect();

        match schemes.len() {
            0 => AuthScheme::None,
            1 => schemes.remove(0),
            _ => AuthScheme::Multiple(schemes),
        }
    }

    /// The scheme a client should use: the first of a `Multiple`
    pub fn primary(&self) -> &AuthScheme {
        match self {
            AuthScheme::Multiple(schemes) => schemes.first().unwrap_or(&AuthScheme::None),
            other => other,
        }
    }

    fn from_scheme(scheme: &SecurityScheme) -> Self {
        match scheme {
            SecurityScheme::ApiKey { name, location } => AuthScheme::ApiKey {
                name: name.clone(),
                location: *location,
            },
            SecurityScheme::Http {
                scheme,
                bearer_format,
            } => match scheme.to_lowercase().as_str() {
                "basic" => AuthScheme::Basic,
                "bearer" => AuthScheme::Bearer {
                    format: bearer_format.clone(),
                },
                _ => AuthScheme::Bearer { format: None },
            },
            // OAuth2 and OpenID Connect access tokens travel as bearer tokens
            SecurityScheme::OAuth2 | SecurityScheme::OpenIdConnect { .. } => {
                AuthScheme::Bearer { format: None }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(name: &str) -> SecurityRequirement {
        SecurityRequirement {
            scheme_name: name.to_string(),
            scopes: vec![],
        }
    }

    #[test]
    fn test_detect_bearer() {
        let mut schemes = IndexMap::new();
        schemes.insert(
            "bearerAuth".to_string(),
            SecurityScheme::Http {
                scheme: "bearer".to_string(),
                bearer_format: Some("JWT".to_string()),
            },
        );

        let auth = AuthScheme::detect(&schemes, &[requirement("bearerAuth")]);
        assert_eq!(
            auth,
            AuthScheme::Bearer {
                format: Some("JWT".to_string())
            }
        );
    }

    #[test]
    fn test_detect_api_key_without_requirements() {
        let mut schemes = IndexMap::new();
        schemes.insert(
            "apiKey".to_string(),
            SecurityScheme::ApiKey {
                name: "x-api-key".to_string(),
                location: ApiKeyLocation::Header,
            },
        );
        schemes.insert("oauth".to_string(), SecurityScheme::OAuth2);

        let auth = AuthScheme::detect(&schemes, &[]);
        assert_eq!(
            auth,
            AuthScheme::ApiKey {
                name: "x-api-key".to_string(),
                location: ApiKeyLocation::Header,
            }
        );
    }

    #[test]
    fn test_detect_none() {
        assert_eq!(AuthScheme::detect(&IndexMap::new(), &[]), AuthScheme::None);
        assert_eq!(
            AuthScheme::detect(&IndexMap::new(), &[requirement("missing")]),
            AuthScheme::None
        );
    }

    #[test]
    fn test_multiple_primary_is_first_required() {
        let mut schemes = IndexMap::new();
        schemes.insert("oauth".to_string(), SecurityScheme::OAuth2);
        schemes.insert(
            "basic".to_string(),
            SecurityScheme::Http {
                scheme: "Basic".to_string(),
                bearer_format: None,
            },
        );

        let auth = AuthScheme::detect(&schemes, &[requirement("basic"), requirement("oauth")]);
        assert!(matches!(auth, AuthScheme::Multiple(_)));
        assert_eq!(auth.primary(), &AuthScheme::Basic);
    }
}
