//! Campaigns and their delivery statistics.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::percent;

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// Volume and rate metrics for one send. Always replaced as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
  pub sends:          i64,
  pub opens:          i64,
  pub open_percent:   f64,
  pub clicks:         i64,
  pub click_percent:  f64,
  pub bounces:        i64,
  pub bounce_percent: f64,
  pub unsubs:         i64,
}

impl CampaignMetrics {
  /// Build metrics from raw counts, deriving the three percentages.
  pub fn from_counts(
    sends: i64,
    opens: i64,
    clicks: i64,
    bounces: i64,
    unsubs: i64,
  ) -> Self {
    Self {
      sends,
      opens,
      open_percent: percent(opens, sends),
      clicks,
      click_percent: percent(clicks, sends),
      bounces,
      bounce_percent: percent(bounces, sends),
      unsubs,
    }
  }
}

// ─── Fetched detail ──────────────────────────────────────────────────────────

/// A fully-resolved campaign as returned by the campaign source, before
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignDetail {
  pub campaign_id:   String,
  pub statid:        String,
  pub campaign_name: String,
  /// Send date in the configured local timezone.
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub metrics:       CampaignMetrics,
}

impl CampaignDetail {
  /// The campaign row to persist for this detail.
  pub fn to_new_campaign(&self) -> NewCampaign {
    NewCampaign {
      campaign_id:   self.campaign_id.clone(),
      statid:        self.statid.clone(),
      campaign_name: self.campaign_name.clone(),
      date:          self.date,
      time:          self.time,
      is_seed:       is_seed_name(&self.campaign_name),
    }
  }
}

// ─── Persisted rows ──────────────────────────────────────────────────────────

/// Input for [`crate::store::ReportStore::upsert_campaign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
  pub campaign_id:   String,
  pub statid:        String,
  pub campaign_name: String,
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub is_seed:       bool,
}

/// A stored campaign row, without its stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Campaign {
  pub id:            i64,
  pub tenant_id:     i64,
  pub campaign_id:   String,
  pub statid:        String,
  pub campaign_name: String,
  pub date:          NaiveDate,
  pub time:          NaiveTime,
  pub is_seed:       bool,
}

/// One row of the read-path join: tenant × campaign × stat.
///
/// A campaign whose stat row is missing carries zeroed metrics and no
/// `last_fetched_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRow {
  pub tenant_code:     String,
  pub tenant_name:     String,
  pub le_domain:       String,
  pub statid:          String,
  pub campaign_id:     String,
  pub campaign_name:   String,
  pub date:            NaiveDate,
  pub time:            NaiveTime,
  pub is_seed:         bool,
  pub metrics:         CampaignMetrics,
  pub last_fetched_at: Option<DateTime<Utc>>,
}

// ─── Seeds ───────────────────────────────────────────────────────────────────

/// Which campaigns a range query returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedFilter {
  /// Regular campaigns only.
  #[default]
  Exclude,
  /// Seed campaigns only.
  Only,
  All,
}

const SEED_MARKERS: [&str; 3] = ["seed", "wseed", "iaseed"];

/// Internal seed/test sends are recognised by name alone.
pub fn is_seed_name(name: &str) -> bool {
  let lower = name.to_lowercase();
  SEED_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seed_names() {
    assert!(is_seed_name("0216-cfl-e3-seed"));
    assert!(is_seed_name("WSEED-test"));
    assert!(is_seed_name("iaseed_promo"));
    assert!(!is_seed_name("0216-cfl-e3"));
    assert!(!is_seed_name(""));
  }

  #[test]
  fn metrics_from_counts() {
    let m = CampaignMetrics::from_counts(200, 50, 10, 3, 1);
    assert_eq!(m.open_percent, 25.0);
    assert_eq!(m.click_percent, 5.0);
    assert_eq!(m.bounce_percent, 1.5);

    let empty = CampaignMetrics::from_counts(0, 4, 2, 1, 0);
    assert_eq!(empty.open_percent, 0.0);
    assert_eq!(empty.click_percent, 0.0);
    assert_eq!(empty.bounce_percent, 0.0);
  }
}
