//! Error type shared by both upstream clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
  /// The remote system answered, but its own status field reports failure.
  #[error("[{context}] {message}")]
  Protocol { context: String, message: String },

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("HTTP {status} from {url}")]
  HttpStatus {
    status: reqwest::StatusCode,
    url:    String,
  },

  /// Login refused, or a token still rejected after re-authenticating.
  #[error("authentication failed: {0}")]
  Auth(String),
}

pub type Result<T, E = UpstreamError> = std::result::Result<T, E>;
