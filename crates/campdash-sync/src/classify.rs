//! Per-campaign filtering applied to every fetched detail before it is
//! written.

use chrono::NaiveDate;

use campdash_core::{
  campaign::{CampaignDetail, is_seed_name},
  window::{DateRange, is_live},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  /// Sent outside the requested range; the upstream lookback is coarser
  /// than the range.
  OutOfRange,
  /// Fewer sends than the configured minimum. Never stored.
  LowSends,
  Keep {
    is_seed: bool,
    /// Inside the live window: always overwritten. Otherwise written once.
    live:    bool,
  },
}

/// Classify `detail`, checking in order: range, volume, seed name, liveness.
pub fn classify(
  detail: &CampaignDetail,
  range: DateRange,
  cutoff: NaiveDate,
  min_sends: i64,
) -> Disposition {
  if !range.contains(detail.date) {
    return Disposition::OutOfRange;
  }
  if detail.metrics.sends < min_sends {
    return Disposition::LowSends;
  }
  Disposition::Keep {
    is_seed: is_seed_name(&detail.campaign_name),
    live:    is_live(detail.date, cutoff),
  }
}
