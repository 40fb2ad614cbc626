//! Error types for connector-core

use thiserror::Error;

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Reasons config synthesis can fail. Synthesis never emits a partial config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("No suitable chat endpoint found in spec")]
    NoChatEndpoint,

    #[error("No prompt field found in request schema of {endpoint}")]
    NoPromptField { endpoint: String },

    #[error("No reply field found in response schema of {endpoint}")]
    NoResponseField { endpoint: String },
}

/// Connector error types
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Config synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Invalid connector config: {0}")]
    InvalidConfig(String),

    #[error("Credential not found: set {0} or pass a credential explicitly")]
    CredentialNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_errors_convert_with_context() {
        let err: ConnectorError = SynthesisError::NoPromptField {
            endpoint: "/chat".to_string(),
        }
        .into();

        assert!(matches!(err, ConnectorError::Synthesis(_)));
        assert_eq!(
            err.to_string(),
            "Config synthesis failed: No prompt field found in request schema of /chat"
        );
    }

    #[test]
    fn test_bad_config_json_is_a_serialization_error() {
        let err: ConnectorError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConnectorError::SerializationError(_)));
    }
}
