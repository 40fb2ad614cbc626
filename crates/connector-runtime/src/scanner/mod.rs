//! Batch scanning: send every prompt in a file and judge the replies
//!
//! Prompts are processed one at a time, each to completion (retries
//! included) before the next starts.

pub mod analyzer;
pub mod report;

use async_trait::async_trait;
use connector_core::ErrorKind;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, RuntimeError};
use crate::executor::{ConnectorReply, ConnectorRuntime, Sleeper};
use crate::transport::Transport;

pub use analyzer::{Analyzer, MockAnalyzer, Verdict};
pub use report::{render_summary, ErrorCount, ScanReport, ScanSummary};

/// Canned replies for mock mode
pub const MOCK_REPLIES: &[&str] = &[
    "I'd be happy to help with that!",
    "That's an interesting question. Let me explain...",
    "Here's what I think about that topic.",
    "I understand your query. The answer is...",
    "Great question! Based on my knowledge...",
];

/// Whether replies come from the provider or from canned text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Live,
    Mock,
}

/// Result of scanning one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Position in the prompt file, from 0
    pub index: usize,
    pub prompt: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub response: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub status: Option<u16>,
    pub retries: u32,
    pub latency_ms: u64,
}

/// Split prompt file text into prompts: one per line, trimmed, blanks skipped
pub fn parse_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_prompts(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let prompts = parse_prompts(&std::fs::read_to_string(path)?);
    debug!("Loaded {} prompts from {:?}", prompts.len(), path);
    Ok(prompts)
}

/// Produces a reply for a prompt
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, prompt: &str) -> std::result::Result<ConnectorReply, RuntimeError>;
}

#[async_trait]
impl<T: Transport, S: Sleeper> Responder for ConnectorRuntime<T, S> {
    async fn respond(&self, prompt: &str) -> std::result::Result<ConnectorReply, RuntimeError> {
        self.send_prompt(prompt).await
    }
}

/// Seed for the mock responder given the scan seed.
///
/// The analyzer takes the scan seed as is; the responder gets its own
/// stream so reply choice and verdicts are not drawn in lockstep.
pub fn responder_seed(scan_seed: Option<u64>) -> Option<u64> {
    scan_seed.map(|seed| seed.wrapping_add(1))
}

/// Offline responder: canned replies after a simulated 100-300ms delay
pub struct MockResponder<S> {
    rng: Mutex<StdRng>,
    sleeper: S,
}

impl<S: Sleeper> MockResponder<S> {
    pub fn new(seed: Option<u64>, sleeper: S) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            sleeper,
        }
    }
}

#[async_trait]
impl<S: Sleeper> Responder for MockResponder<S> {
    async fn respond(&self, prompt: &str) -> std::result::Result<ConnectorReply, RuntimeError> {
        let (phrase, delay_ms) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| RuntimeError::new(ErrorKind::Unknown, "mock RNG poisoned"))?;
            let phrase = MOCK_REPLIES.choose(&mut *rng).copied().unwrap_or_default();
            (phrase, rng.gen_range(100..=300u64))
        };

        self.sleeper.sleep(Duration::from_millis(delay_ms)).await;

        let excerpt: String = prompt.chars().take(30).collect();
        Ok(ConnectorReply {
            content: format!("{} (Re: {}...)", phrase, excerpt),
            raw: json!({"mock": true}),
            status: 200,
            retries: 0,
            latency_ms: delay_ms,
        })
    }
}

/// Runs prompts through a responder and an analyzer
pub struct Scanner<R, A> {
    responder: R,
    analyzer: A,
}

impl<R: Responder, A: Analyzer> Scanner<R, A> {
    pub fn new(responder: R, analyzer: A) -> Self {
        Self { responder, analyzer }
    }

    /// Scan one prompt; failures become `error` results
    pub async fn scan_prompt(&mut self, index: usize, prompt: &str) -> ScanResult {
        match self.responder.respond(prompt).await {
            Ok(reply) => {
                let (verdict, confidence) = self.analyzer.analyze(prompt, &reply.content);
                ScanResult {
                    index,
                    prompt: prompt.to_string(),
                    verdict,
                    confidence,
                    response: Some(reply.content),
                    error_kind: None,
                    error_message: None,
                    status: Some(reply.status),
                    retries: reply.retries,
                    latency_ms: reply.latency_ms,
                }
            }
            Err(err) => ScanResult {
                index,
                prompt: prompt.to_string(),
                verdict: Verdict::Error,
                confidence: 0.0,
                response: None,
                error_kind: Some(err.kind),
                error_message: Some(err.message),
                status: err.status,
                retries: err.retries,
                latency_ms: err.latency_ms,
            },
        }
    }

    /// Scan all prompts in order, reporting each result as it lands
    pub async fn scan_all(
        &mut self,
        prompts: &[String],
        mut on_result: impl FnMut(&ScanResult, usize),
    ) -> Vec<ScanResult> {
        let mut results = Vec::with_capacity(prompts.len());

        for (index, prompt) in prompts.iter().enumerate() {
            let result = self.scan_prompt(index, prompt).await;
            on_result(&result, prompts.len());
            results.push(result);
        }

        info!("Scanned {} prompts", results.len());
        results
    }
}
