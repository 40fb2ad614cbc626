//! Send prompts through a connector config
//!
//! One call is: build the request from the config, send it, classify the
//! outcome, and retry transient failures with exponential backoff.

use async_trait::async_trait;
use connector_core::config::AuthLocation;
use connector_core::dotpath::{self, DotPathError};
use connector_core::{ConnectorConfig, ErrorKind, RetryPolicy, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::RuntimeError;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Waits between retry attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A successful reply
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorReply {
    /// Reply text extracted at `response_field`
    pub content: String,
    /// Full parsed response body
    pub raw: Value,
    pub status: u16,
    pub retries: u32,
    /// Latency of the final attempt
    pub latency_ms: u64,
}

/// Executes prompts against one provider
pub struct ConnectorRuntime<T = ReqwestTransport, S = TokioSleeper> {
    config: ConnectorConfig,
    credential: Option<SecretString>,
    policy: RetryPolicy,
    transport: T,
    sleeper: S,
}

impl ConnectorRuntime<ReqwestTransport, TokioSleeper> {
    /// Runtime over reqwest with the given request timeout
    pub fn new(
        config: ConnectorConfig,
        credential: Option<SecretString>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_parts(config, credential, policy, transport, TokioSleeper))
    }
}

impl<T: Transport, S: Sleeper> ConnectorRuntime<T, S> {
    pub fn with_parts(
        config: ConnectorConfig,
        credential: Option<SecretString>,
        policy: RetryPolicy,
        transport: T,
        sleeper: S,
    ) -> Self {
        Self {
            config,
            credential,
            policy,
            transport,
            sleeper,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Send one prompt, retrying per the policy
    pub async fn send_prompt(&self, prompt: &str) -> Result<ConnectorReply, RuntimeError> {
        let request = self.build_request(prompt)?;
        let mut attempt: u32 = 0;

        loop {
            info!("{} {}", request.method, self.config.endpoint_url());

            let started = Instant::now();
            let outcome = match self.transport.send(&request).await {
                Ok(response) => self.interpret(response),
                Err(err) => Err(Self::transport_failure(err)),
            };
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let mut err = match outcome {
                Ok((content, raw, status)) => {
                    debug!("Reply received in {}ms after {} retries", latency_ms, attempt);
                    return Ok(ConnectorReply {
                        content,
                        raw,
                        status,
                        retries: attempt,
                        latency_ms,
                    });
                }
                Err(err) => err,
            };

            if self.policy.should_retry(err.kind, attempt) {
                let delay = self.policy.delay_for(attempt);
                warn!(
                    provider = %self.config.provider,
                    attempt = attempt + 1,
                    max = self.policy.max_retries,
                    error_type = err.kind.as_str(),
                    delay_secs = delay.as_secs_f64(),
                    error = %err.message,
                    "Retrying after error"
                );
                self.sleeper.sleep(delay).await;
                attempt += 1;
                continue;
            }

            if self.policy.is_retryable(err.kind) {
                warn!(
                    provider = %self.config.provider,
                    attempt = attempt + 1,
                    max = self.policy.max_retries + 1,
                    "Max retries exhausted"
                );
            } else {
                warn!(
                    provider = %self.config.provider,
                    error_type = err.kind.as_str(),
                    "Non-retryable error, failing immediately"
                );
            }
            error!("Request to {} failed: {}", self.config.provider, err);

            err.retries = attempt;
            err.latency_ms = latency_ms;
            return Err(err);
        }
    }

    /// Build the request for a prompt: URL, headers and body
    pub fn build_request(&self, prompt: &str) -> Result<HttpRequest, RuntimeError> {
        let auth = self.config.auth();
        let rendered = if auth.is_none() {
            None
        } else {
            let credential = self.credential.as_ref().ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::AuthError,
                    format!("No credential provided for {}", self.config.provider),
                )
            })?;
            Some(auth.render(credential.expose()))
        };

        let mut headers = vec![(
            "Content-Type".to_string(),
            self.config.request.content_type.clone(),
        )];
        headers.extend(
            self.config
                .request
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let mut target = self.config.endpoint_url();
        let mut body = self.build_body(prompt).map_err(Self::body_failure)?;

        if let Some(value) = rendered {
            match auth.location {
                AuthLocation::Header => headers.push((auth.key_name.clone(), value)),
                AuthLocation::Query => {
                    let mut parsed = url::Url::parse(&target).map_err(|e| {
                        RuntimeError::new(ErrorKind::ParseError, format!("Invalid URL {}: {}", target, e))
                    })?;
                    parsed.query_pairs_mut().append_pair(&auth.key_name, &value);
                    target = parsed.to_string();
                }
                AuthLocation::Body => {
                    dotpath::set(&mut body, &auth.key_name, Value::String(value))
                        .map_err(Self::body_failure)?;
                }
                AuthLocation::None => {}
            }
        }

        Ok(HttpRequest {
            method: self.config.request.method,
            url: target,
            headers,
            body,
        })
    }

    /// Body from `static_fields` with the prompt injected
    pub fn build_body(&self, prompt: &str) -> Result<Value, DotPathError> {
        let mut body = Value::Object(self.config.request.static_fields.clone());

        if self.config.request.has_prompt_placeholder() {
            substitute_prompt(&mut body, prompt);
        } else {
            dotpath::set(
                &mut body,
                &self.config.request.prompt_field,
                Value::String(prompt.to_string()),
            )?;
        }

        Ok(body)
    }

    /// Classify a response; on success yields content, raw body and status
    fn interpret(&self, response: HttpResponse) -> Result<(String, Value, u16), RuntimeError> {
        let HttpResponse { status, body } = response;

        if let Some(kind) = ErrorKind::from_status(status) {
            let raw = serde_json::from_str::<Value>(&body).ok();
            let detail = raw
                .as_ref()
                .zip(self.config.response.error_field.as_deref())
                .and_then(|(raw, field)| dotpath::resolve(raw, field).ok())
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or(body);

            let mut message = format!("API returned status {}", status);
            if !detail.is_empty() {
                message.push_str(": ");
                message.push_str(&detail);
            }
            return Err(RuntimeError::new(kind, message).with_status(status).with_raw(raw));
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            RuntimeError::new(ErrorKind::ParseError, format!("Response is not valid JSON: {}", e))
                .with_status(status)
        })?;

        let field = &self.config.response.response_field;
        let content = match dotpath::resolve(&raw, field) {
            Ok(Value::Null) => Err(format!("Reply field '{}' is null", field)),
            Ok(Value::String(s)) => Ok(s.clone()),
            Ok(other) => Ok(other.to_string()),
            Err(e) => Err(format!("Reply field '{}' not found: {}", field, e)),
        };

        match content {
            Ok(content) => Ok((content, raw, status)),
            Err(message) => Err(RuntimeError::new(ErrorKind::ParseError, message)
                .with_status(status)
                .with_raw(Some(raw))),
        }
    }

    fn transport_failure(err: TransportError) -> RuntimeError {
        let kind = match err {
            TransportError::Timeout(_) => ErrorKind::Timeout,
            TransportError::Network(_) => ErrorKind::NetworkError,
        };
        RuntimeError::new(kind, err.to_string())
    }

    fn body_failure(err: DotPathError) -> RuntimeError {
        RuntimeError::new(ErrorKind::ParseError, format!("Cannot build request body: {}", err))
    }
}

/// Replace `{prompt}` in every string of the tree
fn substitute_prompt(value: &mut Value, prompt: &str) {
    match value {
        Value::String(s) if s.contains(connector_core::config::PROMPT_PLACEHOLDER) => {
            *s = s.replace(connector_core::config::PROMPT_PLACEHOLDER, prompt);
        }
        Value::Array(items) => items.iter_mut().for_each(|v| substitute_prompt(v, prompt)),
        Value::Object(map) => map.values_mut().for_each(|v| substitute_prompt(v, prompt)),
        _ => {}
    }
}
