//! # openapi-parser
//!
//! OpenAPI 3.x loader for AI Connector.
//! Extracts operations (in declaration order) with `$ref`-resolved schemas,
//! servers and security schemes, which the config synthesizer scores and maps.

mod types;
mod parser;
mod auth;
mod operations;
mod resolver;
mod error;

pub use types::*;
pub use parser::OpenApiParser;
pub use auth::AuthScheme;
pub use operations::OperationExtractor;
pub use resolver::SchemaResolver;
pub use error::{ParseError, ParseResult};
