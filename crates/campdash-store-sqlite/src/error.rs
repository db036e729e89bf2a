//! Error type for `campdash-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("tenant with code {0:?} already exists")]
  DuplicateTenant(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
