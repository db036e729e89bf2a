//! Error types for `campdash-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date range: {start} is after {end}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },

  #[error("invalid date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("unknown timezone: {0:?}")]
  UnknownTimezone(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
