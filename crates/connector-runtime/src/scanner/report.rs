//! Scan summary statistics, JSON export and the text summary block

use chrono::{DateTime, SecondsFormat, Utc};
use connector_core::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::analyzer::Verdict;
use super::{ScanMode, ScanResult};
use crate::error::Result;

/// Count of one error kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCount {
    pub kind: ErrorKind,
    pub count: usize,
}

/// Aggregate statistics over a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub good: usize,
    pub bad: usize,
    pub errors: usize,
    pub good_pct: f64,
    pub bad_pct: f64,
    pub error_pct: f64,
    pub avg_latency_ms: f64,
    /// Mean confidence over non-error results, 0 when there are none
    pub avg_confidence: f64,
    pub total_retries: u32,
    /// Most frequent first; ties in kind order
    pub error_breakdown: Vec<ErrorCount>,
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

impl ScanSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let total = results.len();
        let count = |verdict: Verdict| results.iter().filter(|r| r.verdict == verdict).count();
        let good = count(Verdict::Good);
        let bad = count(Verdict::Bad);
        let errors = count(Verdict::Error);

        let avg_latency_ms = if total == 0 {
            0.0
        } else {
            results.iter().map(|r| r.latency_ms as f64).sum::<f64>() / total as f64
        };

        let scored = total - errors;
        let avg_confidence = if scored == 0 {
            0.0
        } else {
            results
                .iter()
                .filter(|r| r.verdict != Verdict::Error)
                .map(|r| r.confidence)
                .sum::<f64>()
                / scored as f64
        };

        let mut by_kind: BTreeMap<ErrorKind, usize> = BTreeMap::new();
        for result in results.iter().filter(|r| r.verdict == Verdict::Error) {
            *by_kind.entry(result.error_kind.unwrap_or(ErrorKind::Unknown)).or_default() += 1;
        }
        let mut error_breakdown: Vec<ErrorCount> = by_kind
            .into_iter()
            .map(|(kind, count)| ErrorCount { kind, count })
            .collect();
        error_breakdown.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total,
            good,
            bad,
            errors,
            good_pct: pct(good, total),
            bad_pct: pct(bad, total),
            error_pct: pct(errors, total),
            avg_latency_ms,
            avg_confidence,
            total_retries: results.iter().map(|r| r.retries).sum(),
            error_breakdown,
        }
    }
}

/// Exported scan results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub config_name: String,
    pub mode: ScanMode,
    pub total: usize,
    pub summary: ScanSummary,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn new(config_name: impl Into<String>, mode: ScanMode, results: Vec<ScanResult>) -> Self {
        Self::at(Utc::now(), config_name, mode, results)
    }

    fn at(
        now: DateTime<Utc>,
        config_name: impl Into<String>,
        mode: ScanMode,
        results: Vec<ScanResult>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            config_name: config_name.into(),
            mode,
            total: results.len(),
            summary: ScanSummary::from_results(&results),
            results,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Scan report written to {:?}", path);
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

const RULE: &str = "============================================================";

/// Human-readable summary block
pub fn render_summary(config_name: &str, results: &[ScanResult]) -> String {
    let mut out = String::new();
    let summary = ScanSummary::from_results(results);

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "SCAN SUMMARY - {}", config_name);
    let _ = writeln!(out, "{}", RULE);

    if summary.total == 0 {
        let _ = writeln!(out, "No prompts scanned.");
        let _ = writeln!(out, "{}", RULE);
        return out;
    }

    let _ = writeln!(out, "Total prompts:     {}", summary.total);
    let _ = writeln!(out, "Good responses:    {} ({:.1}%)", summary.good, summary.good_pct);
    let _ = writeln!(out, "Bad responses:     {} ({:.1}%)", summary.bad, summary.bad_pct);
    let _ = writeln!(out, "Errors:            {} ({:.1}%)", summary.errors, summary.error_pct);
    let _ = writeln!(out, "Avg latency:       {:.0}ms", summary.avg_latency_ms);
    let _ = writeln!(out, "Avg confidence:    {:.2}", summary.avg_confidence);
    if summary.total_retries > 0 {
        let _ = writeln!(out, "Total retries:     {}", summary.total_retries);
    }
    let _ = writeln!(out, "{}", RULE);

    if !summary.error_breakdown.is_empty() {
        let _ = writeln!(out, "\nERRORS:");
        for entry in &summary.error_breakdown {
            let _ = writeln!(out, "  {}: {}", entry.kind, entry.count);
        }
    }

    if summary.bad > 0 {
        let _ = writeln!(out, "\nBAD RESPONSES:");
        for result in results.iter().filter(|r| r.verdict == Verdict::Bad) {
            let _ = writeln!(out, "  Prompt: {}...", truncate(&result.prompt, 50));
            let response = result.response.as_deref().map(|r| truncate(r, 100));
            let _ = writeln!(out, "  Response: {}...", response.as_deref().unwrap_or("N/A"));
            let _ = writeln!(out);
        }
    }

    out
}
