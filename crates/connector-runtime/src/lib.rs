//! # connector-runtime
//!
//! Executes prompts through a `ConnectorConfig`:
//! - Request building, status classification and retries with backoff
//! - Pluggable HTTP transport (reqwest by default)
//! - Batch scanning with live or mock replies and JSON reports

pub mod error;
pub mod executor;
pub mod scanner;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{AppError, Result, RuntimeError};
pub use executor::{ConnectorReply, ConnectorRuntime, Sleeper, TokioSleeper};
pub use scanner::{MockAnalyzer, MockResponder, ScanMode, ScanReport, ScanResult, Scanner, Verdict};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
