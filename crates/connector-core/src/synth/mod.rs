//! Connector config synthesis from OpenAPI specs
//!
//! Scoring picks the chat endpoint, mapping finds where the prompt goes and
//! where the reply comes back, and the generator assembles the config.

pub mod generator;
pub mod mapping;
pub mod scorer;

pub use generator::{auth_config, ConfigGenerator};
pub use mapping::{find_prompt_field, find_reply_path, PromptMapping};
pub use scorer::{rank_candidates, score_operation, score_path, EndpointCandidate};
