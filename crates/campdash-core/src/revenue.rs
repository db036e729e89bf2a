//! Revenue-platform source rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One traffic source's figures for a report date, as reported upstream.
/// `epl` and `epv` are never recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
  pub source:        String,
  pub visitors:      i64,
  pub total_leads:   i64,
  pub sold_leads:    i64,
  pub total_revenue: f64,
  pub epl:           f64,
  pub epv:           f64,
}

/// A cached [`SourceRow`] with the date it reports on and when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSource {
  #[serde(flatten)]
  pub row:         SourceRow,
  pub report_date: NaiveDate,
  pub fetched_at:  DateTime<Utc>,
}

/// Summed revenue figures attributed to one campaign name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RevenueMatch {
  pub revenue:    f64,
  pub visitors:   i64,
  pub leads:      i64,
  pub sold_leads: i64,
}
