//! Error classification and retry policy for provider calls

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of a failed provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 401, 403
    AuthError,
    /// 429
    RateLimit,
    /// 400
    BadRequest,
    /// 5xx
    ServerError,
    Timeout,
    NetworkError,
    /// Response did not match the configured shape
    ParseError,
    /// Any other 4xx
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthError => "auth_error",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Classify an HTTP status; `None` for non-error statuses
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(ErrorKind::AuthError),
            429 => Some(ErrorKind::RateLimit),
            400 => Some(ErrorKind::BadRequest),
            500..=u16::MAX => Some(ErrorKind::ServerError),
            402..=499 => Some(ErrorKind::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_retry_on() -> Vec<ErrorKind> {
    vec![
        ErrorKind::RateLimit,
        ErrorKind::ServerError,
        ErrorKind::Timeout,
        ErrorKind::NetworkError,
    ]
}

/// Exponential backoff policy. `attempt` is 0 for the first retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Seconds
    pub base_delay: f64,
    /// Seconds
    pub max_delay: f64,
    pub exponential_base: f64,
    pub retry_on: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 1.0,
            max_delay: 30.0,
            exponential_base: 2.0,
            retry_on: default_retry_on(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// `min(base_delay * exponential_base^attempt, max_delay)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (self.base_delay * self.exponential_base.powi(exponent)).min(self.max_delay);
        Duration::from_secs_f64(secs.max(0.0))
    }

    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Whether a failure of `kind` after `attempt` retries gets another try
    pub fn should_retry(&self, kind: ErrorKind, attempt: u32) -> bool {
        attempt < self.max_retries && self.is_retryable(kind)
    }
}
