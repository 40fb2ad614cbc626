//! Provider credentials with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ConnectorError, Result};

/// Fallback variable consulted when the provider-specific one is unset
pub const GENERIC_KEY_VAR: &str = "API_KEY";

/// API key or token - automatically zeroed when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    /// Get the secret value (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Environment variable holding a provider's key: `OPENAI_API_KEY` for "openai"
pub fn provider_key_var(provider: &str) -> String {
    let normalized: String = provider
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}_API_KEY", normalized)
}

/// Resolve a credential: explicit value, else `<PROVIDER>_API_KEY`, else `API_KEY`
pub fn resolve_credential(provider: &str, explicit: Option<&str>) -> Result<SecretString> {
    resolve_with(provider, explicit, |name| std::env::var(name).ok())
}

fn resolve_with(
    provider: &str,
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Ok(SecretString::new(value));
    }

    let provider_var = provider_key_var(provider);
    let found = [provider_var.as_str(), GENERIC_KEY_VAR]
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.is_empty()));

    match found {
        Some(value) => Ok(SecretString::new(value)),
        None => Err(ConnectorError::CredentialNotFound(provider_var)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_provider_key_var() {
        assert_eq!(provider_key_var("openai"), "OPENAI_API_KEY");
        assert_eq!(provider_key_var("my-llm.io"), "MY_LLM_IO_API_KEY");
    }

    #[test]
    fn test_explicit_credential_wins() {
        let secret = resolve_with("openai", Some("sk-flag"), env(&[("OPENAI_API_KEY", "sk-env")])).unwrap();
        assert_eq!(secret.expose(), "sk-flag");
    }

    #[test]
    fn test_provider_var_then_generic() {
        let lookup = env(&[("OPENAI_API_KEY", "sk-env"), ("API_KEY", "generic")]);
        assert_eq!(resolve_with("openai", None, lookup).unwrap().expose(), "sk-env");

        let lookup = env(&[("API_KEY", "generic")]);
        assert_eq!(resolve_with("openai", None, lookup).unwrap().expose(), "generic");
    }

    #[test]
    fn test_missing_credential_names_provider_var() {
        let err = resolve_with("cohere", None, env(&[])).unwrap_err();
        assert!(matches!(err, ConnectorError::CredentialNotFound(var) if var == "COHERE_API_KEY"));
    }

    #[test]
    fn test_debug_redacted() {
        let secret = SecretString::new("sk-very-secret");
        let debug = format!("{:?}", secret);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("sk-very-secret"));
    }
}
