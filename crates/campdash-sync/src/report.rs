//! Outcomes of sync runs, serialised as-is by the API.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use campdash_core::window::DateRange;

/// Counters for one tenant that was fetched successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenantSummary {
  pub code:      String,
  pub name:      String,
  /// Details returned by the campaign source.
  pub fetched:   u64,
  /// Campaigns written to the store.
  pub updated:   u64,
  /// Outside the range, or historical and already cached.
  pub skipped:   u64,
  pub seeds:     u64,
  pub low_sends: u64,
}

/// A failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIssue {
  pub tenant:      String,
  /// Set when a single campaign failed; absent when the whole tenant did.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub campaign_id: Option<String>,
  pub error:       String,
}

/// The upstream window actually requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
  pub start:         NaiveDate,
  pub end:           NaiveDate,
  pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
  pub run_id:            Uuid,
  pub success:           bool,
  pub requested:         DateRange,
  pub cutoff:            NaiveDate,
  /// `None` when everything was served from the cache.
  pub fetch:             Option<FetchWindow>,
  pub tenants:           Vec<TenantSummary>,
  pub total_campaigns:   u64,
  pub seed_campaigns:    u64,
  pub skipped_low_sends: u64,
  pub errors:            Vec<SyncIssue>,
  /// Local wall-clock time the run started.
  pub sync_time:         NaiveDateTime,
}

impl SyncReport {
  pub(crate) fn empty(
    requested: DateRange,
    cutoff: NaiveDate,
    sync_time: NaiveDateTime,
  ) -> Self {
    Self {
      run_id: Uuid::new_v4(),
      success: true,
      requested,
      cutoff,
      fetch: None,
      tenants: Vec::new(),
      total_campaigns: 0,
      seed_campaigns: 0,
      skipped_low_sends: 0,
      errors: Vec::new(),
      sync_time,
    }
  }

  pub(crate) fn add_tenant(&mut self, summary: TenantSummary) {
    self.total_campaigns += summary.updated;
    self.seed_campaigns += summary.seeds;
    self.skipped_low_sends += summary.low_sends;
    self.tenants.push(summary);
  }
}

/// Result of one revenue sync for a single date. Failures are reported
/// here rather than raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSync {
  pub success: bool,
  pub date:    NaiveDate,
  /// The stored rows were fresh enough and the upstream was not called.
  pub cached:  bool,
  pub sources: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

impl RevenueSync {
  pub(crate) fn ok(date: NaiveDate, cached: bool, sources: u64) -> Self {
    Self { success: true, date, cached, sources, error: None }
  }

  pub(crate) fn failed(date: NaiveDate, error: String) -> Self {
    Self {
      success: false,
      date,
      cached: false,
      sources: 0,
      error: Some(error),
    }
  }
}
