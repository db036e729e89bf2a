//! Error type for `campdash-sync`.
//!
//! Only failures that stop a whole operation surface here. Upstream and
//! per-campaign write failures during a sync are collected into the
//! [`SyncReport`](crate::report::SyncReport) instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
  /// Malformed date or range.
  #[error(transparent)]
  Range(#[from] campdash_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("tenant with code {0:?} already exists")]
  DuplicateTenant(String),

  #[error("missing fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),
}

impl SyncError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    SyncError::Store(Box::new(e))
  }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
