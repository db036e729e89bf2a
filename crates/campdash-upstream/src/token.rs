//! Bearer-token cache for the revenue platform.
//!
//! A token stays valid upstream for a few hours, so it is kept in memory and
//! mirrored to a small JSON file so that short-lived CLI runs can reuse it.
//! The file is a convenience: a missing, unreadable or unwritable file only
//! costs an extra login.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
  pub token:           String,
  pub last_login_time: DateTime<Utc>,
}

impl CachedToken {
  pub fn new(token: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      token:           token.into(),
      last_login_time: now,
    }
  }

  /// True while the token is younger than `max_age`.
  pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
    now - self.last_login_time < max_age
  }
}

/// On-disk mirror of the cached token.
#[derive(Debug, Clone)]
pub struct TokenFile {
  path: PathBuf,
}

impl TokenFile {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  pub async fn load(&self) -> Option<CachedToken> {
    let bytes = match tokio::fs::read(&self.path).await {
      Ok(b) => b,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "could not read token file");
        return None;
      }
    };
    match serde_json::from_slice(&bytes) {
      Ok(token) => {
        debug!(path = %self.path.display(), "loaded cached token");
        Some(token)
      }
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "ignoring malformed token file");
        None
      }
    }
  }

  pub async fn save(&self, token: &CachedToken) {
    let bytes = match serde_json::to_vec_pretty(token) {
      Ok(b) => b,
      Err(e) => {
        warn!(error = %e, "could not encode token");
        return;
      }
    };
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(path = %dir.display(), error = %e, "could not create token directory");
        return;
      }
    }
    if let Err(e) = tokio::fs::write(&self.path, bytes).await {
      warn!(path = %self.path.display(), error = %e, "could not write token file");
    }
  }
}
