//! [`SyncService`]: the [`Dashboard`] implementation over a store and the two
//! upstream clients.

use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::{DateTime, Days, Duration, NaiveDate};
use chrono_tz::Tz;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use campdash_core::{
  campaign::{CampaignDetail, CampaignRow, SeedFilter},
  matcher::match_all_campaigns,
  report::{TenantReport, group_campaigns},
  revenue::RevenueMatch,
  store::{CleanupCounts, ReportStore},
  tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery},
  window::{DateRange, FetchPlan, LiveWindow, historical_part, lookback_days},
};
use campdash_upstream::{CampaignSource, Lookback, RevenueFeed};

use crate::{
  Dashboard, Result, SyncError,
  classify::{Disposition, classify},
  clock::{Clock, SystemClock},
  report::{FetchWindow, RevenueSync, SyncIssue, SyncReport, TenantSummary},
};

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SyncSettings {
  pub timezone:              Tz,
  /// Campaigns with fewer sends are discarded.
  pub min_sends:             i64,
  /// Days before today that are still re-fetched on every sync.
  pub live_days:             u32,
  /// Stored revenue younger than this is served without an upstream call.
  pub revenue_cache_minutes: u32,
  /// Tenants upserted by [`Dashboard::reconcile_tenants`].
  pub tenants:               Vec<TenantConfig>,
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      timezone:              chrono_tz::America::New_York,
      min_sends:             50,
      live_days:             2,
      revenue_cache_minutes: 30,
      tenants:               Vec::new(),
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct SyncService<S, C, R> {
  store:     Arc<S>,
  campaigns: C,
  revenue:   R,
  settings:  SyncSettings,
  clock:     Arc<dyn Clock>,
}

struct TenantOutcome {
  summary: Option<TenantSummary>,
  issues:  Vec<SyncIssue>,
}

impl<S, C, R> SyncService<S, C, R> {
  pub fn new(store: Arc<S>, campaigns: C, revenue: R, settings: SyncSettings) -> Self {
    Self {
      store,
      campaigns,
      revenue,
      settings,
      clock: Arc::new(SystemClock),
    }
  }

  /// Replace the wall clock, e.g. with a
  /// [`FixedClock`](crate::clock::FixedClock) in tests.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn settings(&self) -> &SyncSettings { &self.settings }

  fn local_now(&self) -> DateTime<Tz> { self.clock.now().with_timezone(&self.settings.timezone) }

  fn local_today(&self) -> NaiveDate { self.local_now().date_naive() }

  fn live_range(&self) -> DateRange {
    let today = self.local_today();
    let start = today
      .checked_sub_days(Days::new(u64::from(self.settings.live_days)))
      .unwrap_or(NaiveDate::MIN);
    DateRange::new(start, today).unwrap_or(DateRange::single(today))
  }
}

impl<S, C, R> SyncService<S, C, R>
where
  S: ReportStore,
  C: CampaignSource,
  R: RevenueFeed,
{
  async fn sync_tenant(
    &self,
    tenant: Tenant,
    range: DateRange,
    cutoff: NaiveDate,
    lookback: Lookback,
  ) -> TenantOutcome {
    let details = match self.campaigns.full_campaign_stats(&tenant, lookback).await {
      Ok(d) => d,
      Err(e) => {
        error!(tenant = %tenant.name, error = %e, "tenant sync failed");
        return TenantOutcome {
          summary: None,
          issues:  vec![SyncIssue {
            tenant:      tenant.name,
            campaign_id: None,
            error:       e.to_string(),
          }],
        };
      }
    };
    info!(tenant = %tenant.name, campaigns = details.len(), "campaigns from upstream");

    let mut summary = TenantSummary {
      code: tenant.code.clone(),
      name: tenant.name.clone(),
      fetched: details.len() as u64,
      ..TenantSummary::default()
    };
    let mut issues = Vec::new();

    for detail in &details {
      let (is_seed, live) =
        match classify(detail, range, cutoff, self.settings.min_sends) {
          Disposition::OutOfRange => {
            summary.skipped += 1;
            continue;
          }
          Disposition::LowSends => {
            summary.low_sends += 1;
            continue;
          }
          Disposition::Keep { is_seed, live } => (is_seed, live),
        };
      if is_seed {
        summary.seeds += 1;
      }

      match self.store_campaign(&tenant, detail, live).await {
        Ok(true) => summary.updated += 1,
        Ok(false) => summary.skipped += 1,
        Err(e) => {
          error!(
            tenant = %tenant.name,
            campaign_id = %detail.campaign_id,
            error = %e,
            "failed to store campaign"
          );
          issues.push(SyncIssue {
            tenant:      tenant.name.clone(),
            campaign_id: Some(detail.campaign_id.clone()),
            error:       e.to_string(),
          });
        }
      }
    }

    info!(
      tenant = %tenant.name,
      updated = summary.updated,
      skipped = summary.skipped,
      seeds = summary.seeds,
      low_sends = summary.low_sends,
      "tenant synced"
    );
    TenantOutcome {
      summary: Some(summary),
      issues,
    }
  }

  /// Write `detail` unless it is historical and already cached. Returns
  /// whether anything was written.
  async fn store_campaign(
    &self,
    tenant: &Tenant,
    detail: &CampaignDetail,
    live: bool,
  ) -> std::result::Result<bool, S::Error> {
    if !live
      && self
        .store
        .get_campaign_by_statid(tenant.id, &detail.statid)
        .await?
        .is_some()
    {
      return Ok(false);
    }
    self
      .store
      .record_campaign(tenant.id, &detail.to_new_campaign(), &detail.metrics)
      .await?;
    Ok(true)
  }

  /// Match every stored revenue row dated within `range` against the
  /// campaign names in `rows`.
  async fn revenue_map(
    &self,
    range: DateRange,
    rows: &[CampaignRow],
  ) -> Result<HashMap<String, RevenueMatch>> {
    let mut sources = Vec::new();
    for day in range.days() {
      let stored = self
        .store
        .query_revenue_sources_by_date(day)
        .await
        .map_err(SyncError::store)?;
      sources.extend(stored.into_iter().map(|s| s.row));
    }
    if sources.is_empty() {
      return Ok(HashMap::new());
    }
    debug!(sources = sources.len(), campaigns = rows.len(), "matching revenue");
    Ok(match_all_campaigns(
      &sources,
      rows.iter().map(|r| r.campaign_name.as_str()),
    ))
  }
}

impl<S, C, R> Dashboard for SyncService<S, C, R>
where
  S: ReportStore,
  C: CampaignSource,
  R: RevenueFeed,
{
  fn timezone(&self) -> Tz { self.settings.timezone }

  fn today(&self) -> NaiveDate { self.local_today() }

  // ── Campaign sync ─────────────────────────────────────────────────────

  async fn sync_campaigns(&self, range: DateRange) -> Result<SyncReport> {
    let now = self.local_now();
    let today = now.date_naive();
    let cutoff = LiveWindow::new(self.settings.live_days).cutoff(today);

    let cached_history = match historical_part(range, cutoff) {
      Some(history) => self
        .store
        .count_campaigns_in_range(history)
        .await
        .map_err(SyncError::store)?,
      None => 0,
    };
    let plan = FetchPlan::decide(range, cutoff, cached_history);
    let mut report = SyncReport::empty(range, cutoff, now.naive_local());

    let Some(fetch_start) = plan.fetch_start() else {
      info!(
        start = %range.start(),
        end = %range.end(),
        "all dates finalised and cached, no upstream calls needed"
      );
      return Ok(report);
    };

    let days = lookback_days(fetch_start, today);
    report.fetch = Some(FetchWindow {
      start:         fetch_start,
      end:           range.end(),
      lookback_days: days,
    });

    let tenants = self.store.list_tenants(true).await.map_err(SyncError::store)?;
    info!(
      start = %range.start(),
      end = %range.end(),
      %fetch_start,
      lookback_days = days,
      tenants = tenants.len(),
      "syncing campaigns"
    );

    let started = Instant::now();
    let outcomes = join_all(
      tenants
        .into_iter()
        .map(|tenant| self.sync_tenant(tenant, range, cutoff, Lookback::days(days))),
    )
    .await;

    for outcome in outcomes {
      if let Some(summary) = outcome.summary {
        report.add_tenant(summary);
      }
      report.errors.extend(outcome.issues);
    }

    info!(
      run_id = %report.run_id,
      campaigns = report.total_campaigns,
      seeds = report.seed_campaigns,
      low_sends = report.skipped_low_sends,
      errors = report.errors.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "campaign sync complete"
    );
    Ok(report)
  }

  async fn sync_today(&self) -> Result<SyncReport> {
    self.sync_campaigns(DateRange::single(self.local_today())).await
  }

  async fn sync_live_days(&self) -> Result<SyncReport> {
    self.sync_campaigns(self.live_range()).await
  }

  // ── Revenue sync ──────────────────────────────────────────────────────

  async fn sync_revenue(&self, date: NaiveDate, force: bool) -> RevenueSync {
    if !force {
      match self.store.last_revenue_sync(date).await {
        Ok(Some(last)) => {
          let age = self.clock.now() - last;
          let max_age = Duration::minutes(i64::from(self.settings.revenue_cache_minutes));
          if age < max_age {
            match self.store.query_revenue_sources_by_date(date).await {
              Ok(rows) => {
                info!(
                  %date,
                  age_minutes = age.num_minutes(),
                  sources = rows.len(),
                  "revenue cache fresh"
                );
                return RevenueSync::ok(date, true, rows.len() as u64);
              }
              Err(e) => warn!(%date, error = %e, "could not read cached revenue"),
            }
          }
        }
        Ok(None) => {}
        Err(e) => warn!(%date, error = %e, "could not read revenue sync time"),
      }
    }

    let rows = match self.revenue.sources(date, date).await {
      Ok(rows) => rows,
      Err(e) => {
        error!(%date, error = %e, "revenue fetch failed");
        return RevenueSync::failed(date, e.to_string());
      }
    };

    match self.store.upsert_revenue_sources(date, &rows).await {
      Ok(count) => {
        info!(%date, sources = count, "revenue sources stored");
        RevenueSync::ok(date, false, count)
      }
      Err(e) => {
        error!(%date, error = %e, "failed to store revenue sources");
        RevenueSync::failed(date, e.to_string())
      }
    }
  }

  async fn sync_revenue_range(&self, range: DateRange, force: bool) -> Vec<RevenueSync> {
    let mut out = Vec::new();
    for day in range.days() {
      out.push(self.sync_revenue(day, force).await);
    }
    out
  }

  async fn sync_live_revenue(&self, force: bool) -> Vec<RevenueSync> {
    let mut days: Vec<NaiveDate> = self.live_range().days().collect();
    days.reverse();
    let mut out = Vec::with_capacity(days.len());
    for day in days {
      out.push(self.sync_revenue(day, force).await);
    }
    out
  }

  // ── Read path ─────────────────────────────────────────────────────────

  async fn campaigns_grouped(
    &self,
    range: DateRange,
    seeds: SeedFilter,
  ) -> Result<Vec<TenantReport>> {
    let rows = self
      .store
      .query_campaigns_in_range(range, seeds)
      .await
      .map_err(SyncError::store)?;
    let revenue = self.revenue_map(range, &rows).await?;
    Ok(group_campaigns(rows, &revenue))
  }

  async fn today_campaigns(&self) -> Result<Vec<TenantReport>> {
    self
      .campaigns_grouped(DateRange::single(self.local_today()), SeedFilter::Exclude)
      .await
  }

  async fn today_seed_campaigns(&self) -> Result<Vec<TenantReport>> {
    self
      .campaigns_grouped(DateRange::single(self.local_today()), SeedFilter::Only)
      .await
  }

  // ── Maintenance ───────────────────────────────────────────────────────

  async fn cleanup(&self, days: u32) -> Result<CleanupCounts> {
    let cutoff = self
      .clock
      .now()
      .date_naive()
      .checked_sub_days(Days::new(u64::from(days)))
      .unwrap_or(NaiveDate::MIN);
    let counts = self
      .store
      .delete_older_than(cutoff)
      .await
      .map_err(SyncError::store)?;
    info!(
      campaigns = counts.campaigns,
      campaign_stats = counts.campaign_stats,
      revenue_sources = counts.revenue_sources,
      cutoff = %counts.cutoff_date,
      "cleanup complete"
    );
    Ok(counts)
  }

  async fn reconcile_tenants(&self) -> Result<usize> {
    for config in &self.settings.tenants {
      self
        .store
        .upsert_tenant(config)
        .await
        .map_err(SyncError::store)?;
    }
    info!(tenants = self.settings.tenants.len(), "configured tenants reconciled");
    Ok(self.settings.tenants.len())
  }

  // ── Tenant administration ─────────────────────────────────────────────

  async fn list_tenants(&self, enabled_only: bool) -> Result<Vec<Tenant>> {
    self.store.list_tenants(enabled_only).await.map_err(SyncError::store)
  }

  async fn list_tenants_admin(&self, query: TenantQuery) -> Result<TenantPage> {
    self
      .store
      .list_tenants_admin(&query)
      .await
      .map_err(SyncError::store)
  }

  async fn get_tenant(&self, id: i64) -> Result<Option<Tenant>> {
    self.store.get_tenant_by_id(id).await.map_err(SyncError::store)
  }

  async fn create_tenant(&self, config: TenantConfig) -> Result<Tenant> {
    let missing: Vec<&'static str> = [
      ("code", &config.code),
      ("name", &config.name),
      ("api_url", &config.api_url),
      ("username", &config.username),
      ("usertoken", &config.usertoken),
      ("le_domain", &config.le_domain),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();
    if !missing.is_empty() {
      return Err(SyncError::MissingFields(missing));
    }

    if self
      .store
      .get_tenant(&config.code)
      .await
      .map_err(SyncError::store)?
      .is_some()
    {
      return Err(SyncError::DuplicateTenant(config.code));
    }

    let tenant = self
      .store
      .create_tenant(&config)
      .await
      .map_err(SyncError::store)?;
    info!(code = %tenant.code, id = tenant.id, "tenant created");
    Ok(tenant)
  }

  async fn update_tenant(&self, id: i64, patch: TenantPatch) -> Result<Option<Tenant>> {
    if let Some(code) = &patch.code {
      let clash = self
        .store
        .get_tenant(code)
        .await
        .map_err(SyncError::store)?
        .is_some_and(|other| other.id != id);
      if clash {
        return Err(SyncError::DuplicateTenant(code.clone()));
      }
    }

    let updated = self
      .store
      .update_tenant(id, &patch)
      .await
      .map_err(SyncError::store)?;
    if let Some(tenant) = &updated {
      info!(code = %tenant.code, id, "tenant updated");
    }
    Ok(updated)
  }

  async fn delete_tenant(&self, id: i64) -> Result<bool> {
    let deleted = self.store.delete_tenant(id).await.map_err(SyncError::store)?;
    if deleted {
      info!(id, "tenant deleted with its campaigns");
    }
    Ok(deleted)
  }
}
