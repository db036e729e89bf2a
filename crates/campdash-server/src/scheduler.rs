//! Daily retention cleanup.

use std::sync::Arc;

use campdash_sync::Dashboard;
use chrono::{DateTime, Days, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{error, info};

/// The first instant after `now` at which the local clock in `tz` reads
/// `hour:00`. A day whose `hour:00` falls into a DST gap is skipped.
pub fn next_run(now: DateTime<Utc>, tz: Tz, hour: u32) -> DateTime<Utc> {
  let hour = hour.min(23);
  let today = now.with_timezone(&tz).date_naive();
  (0..3)
    .filter_map(|offset| today.checked_add_days(Days::new(offset)))
    .filter_map(|day| day.and_hms_opt(hour, 0, 0))
    .filter_map(|local| tz.from_local_datetime(&local).earliest())
    .map(|at| at.with_timezone(&Utc))
    .find(|at| *at > now)
    .unwrap_or(now + TimeDelta::days(1))
}

async fn run_once<D: Dashboard>(dashboard: &D, days: u32) {
  match dashboard.cleanup(days).await {
    Ok(counts) => info!(
      campaigns = counts.campaigns,
      campaign_stats = counts.campaign_stats,
      revenue_sources = counts.revenue_sources,
      cutoff = %counts.cutoff_date,
      "cleanup finished"
    ),
    Err(e) => error!(error = %e, "cleanup failed"),
  }
}

/// Delete data older than `days` once now, then every day at `hour` local
/// time. Never returns.
pub async fn cleanup_loop<D: Dashboard>(dashboard: Arc<D>, hour: u32, days: u32) {
  run_once(dashboard.as_ref(), days).await;
  loop {
    let now = Utc::now();
    let at = next_run(now, dashboard.timezone(), hour);
    info!(next = %at, "cleanup scheduled");
    let wait = (at - now).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
    run_once(dashboard.as_ref(), days).await;
  }
}
