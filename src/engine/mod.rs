//! Clients for the external transcription and generation engines.
//!
//! Both engines are long-latency collaborators reached over HTTP; every
//! call site treats a failure as recoverable and never lets it end the
//! session. The traits exist so the coordinator and its background
//! activities can be driven by test doubles.

pub mod generation;
pub mod prompt;
pub mod transcription;

use thiserror::Error;

pub use generation::{GenerationEngine, GenerationRequest, HttpGenerationEngine};
pub use transcription::{HttpTranscriptionEngine, TranscriptionEngine};

#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP transport or connection error.
    #[error("engine request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("engine request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected.
    #[error("failed to parse engine response: {0}")]
    Parse(String),

    /// The engine returned a response with no usable content.
    #[error("engine returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Request(e.to_string())
        }
    }
}

/// Build the process-wide HTTP client shared by both engine clients.
///
/// Constructed once at startup; clones share the same connection pool.
pub fn build_http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
