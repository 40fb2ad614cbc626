//! # connector-core
//!
//! Core types for AI Connector:
//! - `ConnectorConfig`, the declarative description of one chat API
//! - Config synthesis from parsed OpenAPI specs
//! - Error classification and retry policy
//! - Dot-path access into JSON bodies
//! - Credential resolution with zeroize-on-drop secrets

pub mod config;
pub mod credential;
pub mod dotpath;
pub mod error;
pub mod policy;
pub mod settings;
pub mod synth;

pub use config::{AuthConfig, AuthLocation, ConnectorConfig, RequestMapping, ResponseMapping};
pub use credential::{resolve_credential, SecretString};
pub use error::{ConnectorError, Result, SynthesisError};
pub use policy::{ErrorKind, RetryPolicy};
pub use settings::{Settings, SettingsManager};
pub use synth::{ConfigGenerator, EndpointCandidate};
