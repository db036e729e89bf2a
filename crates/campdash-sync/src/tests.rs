//! Orchestrator tests against an in-memory store and fake upstreams.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use campdash_core::{
  campaign::{Campaign, CampaignDetail, CampaignMetrics, CampaignRow, NewCampaign, SeedFilter},
  revenue::{SourceRow, StoredSource},
  store::{CleanupCounts, ReportStore},
  tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery},
  window::DateRange,
};
use campdash_store_sqlite::SqliteStore;
use campdash_upstream::{CampaignSource, Lookback, RevenueFeed, UpstreamError};

use crate::{Dashboard, SyncError, SyncService, SyncSettings, clock::FixedClock};

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// Campaign source keyed by tenant code. Tenants without an entry fail.
#[derive(Clone, Default)]
struct FakeCampaigns {
  details:   Arc<Mutex<HashMap<String, Vec<CampaignDetail>>>>,
  calls:     Arc<AtomicUsize>,
  lookbacks: Arc<Mutex<Vec<u32>>>,
}

impl FakeCampaigns {
  fn set(&self, code: &str, details: Vec<CampaignDetail>) {
    self.details.lock().unwrap().insert(code.to_owned(), details);
  }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl CampaignSource for FakeCampaigns {
  async fn full_campaign_stats(
    &self,
    tenant: &Tenant,
    lookback: Lookback,
  ) -> campdash_upstream::Result<Vec<CampaignDetail>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.lookbacks.lock().unwrap().push(lookback.count);
    let found = self.details.lock().unwrap().get(&tenant.code).cloned();
    found.ok_or_else(|| UpstreamError::Protocol {
      context: format!("GetNewslettersSent/{}", tenant.name),
      message: "Invalid token".to_owned(),
    })
  }
}

#[derive(Clone, Default)]
struct FakeRevenue {
  rows:  Vec<SourceRow>,
  fail:  bool,
  calls: Arc<AtomicUsize>,
}

impl RevenueFeed for FakeRevenue {
  async fn sources(
    &self,
    _from: NaiveDate,
    _to: NaiveDate,
  ) -> campdash_upstream::Result<Vec<SourceRow>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(UpstreamError::Auth("login rejected: BAD_PASSWORD".to_owned()));
    }
    Ok(self.rows.clone())
  }
}

/// SQLite store whose campaign writes fail for one statid.
struct FlakyStore {
  inner:       SqliteStore,
  fail_statid: String,
}

impl ReportStore for FlakyStore {
  type Error = campdash_store_sqlite::Error;

  async fn get_tenant(&self, code: &str) -> Result<Option<Tenant>, Self::Error> {
    self.inner.get_tenant(code).await
  }

  async fn get_tenant_by_id(&self, id: i64) -> Result<Option<Tenant>, Self::Error> {
    self.inner.get_tenant_by_id(id).await
  }

  async fn list_tenants(&self, enabled_only: bool) -> Result<Vec<Tenant>, Self::Error> {
    self.inner.list_tenants(enabled_only).await
  }

  async fn list_tenants_admin(&self, query: &TenantQuery) -> Result<TenantPage, Self::Error> {
    self.inner.list_tenants_admin(query).await
  }

  async fn upsert_tenant(&self, config: &TenantConfig) -> Result<Tenant, Self::Error> {
    self.inner.upsert_tenant(config).await
  }

  async fn create_tenant(&self, config: &TenantConfig) -> Result<Tenant, Self::Error> {
    self.inner.create_tenant(config).await
  }

  async fn update_tenant(
    &self,
    id: i64,
    patch: &TenantPatch,
  ) -> Result<Option<Tenant>, Self::Error> {
    self.inner.update_tenant(id, patch).await
  }

  async fn delete_tenant(&self, id: i64) -> Result<bool, Self::Error> {
    self.inner.delete_tenant(id).await
  }

  async fn upsert_campaign(
    &self,
    tenant_id: i64,
    campaign: &NewCampaign,
  ) -> Result<i64, Self::Error> {
    self.inner.upsert_campaign(tenant_id, campaign).await
  }

  async fn upsert_campaign_stat(
    &self,
    campaign_id: i64,
    metrics: &CampaignMetrics,
  ) -> Result<(), Self::Error> {
    self.inner.upsert_campaign_stat(campaign_id, metrics).await
  }

  async fn record_campaign(
    &self,
    tenant_id: i64,
    campaign: &NewCampaign,
    metrics: &CampaignMetrics,
  ) -> Result<i64, Self::Error> {
    if campaign.statid == self.fail_statid {
      return Err(campdash_store_sqlite::Error::DateParse("disk I/O error".to_owned()));
    }
    self.inner.record_campaign(tenant_id, campaign, metrics).await
  }

  async fn get_campaign_by_statid(
    &self,
    tenant_id: i64,
    statid: &str,
  ) -> Result<Option<Campaign>, Self::Error> {
    self.inner.get_campaign_by_statid(tenant_id, statid).await
  }

  async fn count_campaigns_in_range(&self, range: DateRange) -> Result<u64, Self::Error> {
    self.inner.count_campaigns_in_range(range).await
  }

  async fn query_campaigns_in_range(
    &self,
    range: DateRange,
    seeds: SeedFilter,
  ) -> Result<Vec<CampaignRow>, Self::Error> {
    self.inner.query_campaigns_in_range(range, seeds).await
  }

  async fn upsert_revenue_sources(
    &self,
    date: NaiveDate,
    rows: &[SourceRow],
  ) -> Result<u64, Self::Error> {
    self.inner.upsert_revenue_sources(date, rows).await
  }

  async fn query_revenue_sources_by_date(
    &self,
    date: NaiveDate,
  ) -> Result<Vec<StoredSource>, Self::Error> {
    self.inner.query_revenue_sources_by_date(date).await
  }

  async fn last_revenue_sync(
    &self,
    date: NaiveDate,
  ) -> Result<Option<DateTime<Utc>>, Self::Error> {
    self.inner.last_revenue_sync(date).await
  }

  async fn delete_older_than(&self, cutoff: NaiveDate) -> Result<CleanupCounts, Self::Error> {
    self.inner.delete_older_than(cutoff).await
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

type Service = SyncService<SqliteStore, FakeCampaigns, FakeRevenue>;

fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

fn range(start: &str, end: &str) -> DateRange { DateRange::parse(start, end).unwrap() }

/// 12:00 in New York on 2026-02-16; the live cutoff is 2026-02-13.
fn noon() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 2, 16, 17, 0, 0).unwrap() }

fn tenant_cfg(code: &str, name: &str, enabled: bool) -> TenantConfig {
  TenantConfig {
    code:      code.to_owned(),
    name:      name.to_owned(),
    api_url:   "https://upstream.example/xml.php".to_owned(),
    username:  format!("{code}-user"),
    usertoken: "secret".to_owned(),
    le_domain: format!("{code}.example"),
    phase:     2,
    enabled,
  }
}

fn detail(statid: &str, name: &str, date: &str, sends: i64) -> CampaignDetail {
  CampaignDetail {
    campaign_id:   format!("nl-{statid}"),
    statid:        statid.to_owned(),
    campaign_name: name.to_owned(),
    date:          day(date),
    time:          NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    metrics:       CampaignMetrics::from_counts(sends, sends / 4, sends / 10, 2, 1),
  }
}

fn source(name: &str, revenue: f64) -> SourceRow {
  SourceRow {
    source:        name.to_owned(),
    visitors:      30,
    total_leads:   5,
    sold_leads:    2,
    total_revenue: revenue,
    ..SourceRow::default()
  }
}

async fn service_with(
  tenants: Vec<TenantConfig>,
  campaigns: FakeCampaigns,
  revenue: FakeRevenue,
  now: DateTime<Utc>,
) -> Service {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let settings = SyncSettings {
    tenants,
    ..SyncSettings::default()
  };
  let service = SyncService::new(store, campaigns, revenue, settings)
    .with_clock(Arc::new(FixedClock(now)));
  service.reconcile_tenants().await.unwrap();
  service
}

async fn two_tenants(campaigns: FakeCampaigns) -> Service {
  service_with(
    vec![
      tenant_cfg("alpha", "Alpha", true),
      tenant_cfg("beta", "Beta", true),
      tenant_cfg("gamma", "Gamma", false),
    ],
    campaigns,
    FakeRevenue::default(),
    noon(),
  )
  .await
}

// ─── Fetch decision ──────────────────────────────────────────────────────────

#[tokio::test]
async fn cached_history_makes_no_upstream_calls() {
  let campaigns = FakeCampaigns::default();
  let svc = two_tenants(campaigns.clone()).await;

  let alpha = svc.store().get_tenant("alpha").await.unwrap().unwrap();
  svc
    .store()
    .record_campaign(
      alpha.id,
      &detail("1", "0205-a", "2026-02-05", 500).to_new_campaign(),
      &CampaignMetrics::from_counts(500, 10, 1, 0, 0),
    )
    .await
    .unwrap();

  let report = svc.sync_campaigns(range("2026-02-01", "2026-02-10")).await.unwrap();

  assert_eq!(campaigns.calls(), 0);
  assert!(report.success);
  assert!(report.fetch.is_none());
  assert_eq!(report.cutoff, day("2026-02-13"));
  assert!(report.tenants.is_empty());
}

#[tokio::test]
async fn range_spanning_cutoff_calls_each_enabled_tenant_once() {
  let campaigns = FakeCampaigns::default();
  campaigns.set("alpha", vec![]);
  campaigns.set("beta", vec![]);
  let svc = two_tenants(campaigns.clone()).await;

  let report = svc.sync_campaigns(range("2026-02-10", "2026-02-16")).await.unwrap();

  assert_eq!(campaigns.calls(), 2);
  let fetch = report.fetch.unwrap();
  // Cold history: reach back to the range start.
  assert_eq!(fetch.start, day("2026-02-10"));
  assert_eq!(fetch.lookback_days, 7);
  assert_eq!(*campaigns.lookbacks.lock().unwrap(), vec![7, 7]);
  assert_eq!(report.tenants.len(), 2);
}

#[tokio::test]
async fn lookback_is_clamped() {
  let campaigns = FakeCampaigns::default();
  campaigns.set("alpha", vec![]);
  campaigns.set("beta", vec![]);
  let svc = two_tenants(campaigns.clone()).await;

  let today = svc.sync_today().await.unwrap();
  assert_eq!(today.fetch.unwrap().lookback_days, 3);

  let long = svc.sync_campaigns(range("2025-11-01", "2026-02-16")).await.unwrap();
  assert_eq!(long.fetch.unwrap().lookback_days, 30);
}

#[tokio::test]
async fn live_days_sync_covers_today_and_two_previous_days() {
  let campaigns = FakeCampaigns::default();
  campaigns.set("alpha", vec![]);
  campaigns.set("beta", vec![]);
  let svc = two_tenants(campaigns.clone()).await;

  let report = svc.sync_live_days().await.unwrap();
  assert_eq!(report.requested, range("2026-02-14", "2026-02-16"));
  assert_eq!(report.fetch.unwrap().start, day("2026-02-14"));
}

// ─── Classification and writes ───────────────────────────────────────────────

#[tokio::test]
async fn campaigns_are_classified_before_storing() {
  let campaigns = FakeCampaigns::default();
  campaigns.set(
    "alpha",
    vec![
      detail("1", "0216-cfl-e3", "2026-02-16", 100),
      detail("2", "0216-tiny", "2026-02-16", 49),
      detail("3", "0216-IASeed-check", "2026-02-16", 60),
      detail("4", "0215-yesterday", "2026-02-15", 900),
    ],
  );
  campaigns.set("beta", vec![detail("1", "0216-beta", "2026-02-16", 50)]);
  let svc = two_tenants(campaigns.clone()).await;

  let report = svc.sync_today().await.unwrap();

  assert_eq!(report.total_campaigns, 3);
  assert_eq!(report.seed_campaigns, 1);
  assert_eq!(report.skipped_low_sends, 1);
  assert!(report.errors.is_empty());

  let alpha = report.tenants.iter().find(|t| t.code == "alpha").unwrap();
  assert_eq!(alpha.fetched, 4);
  assert_eq!(alpha.updated, 2);
  assert_eq!(alpha.skipped, 1);
  assert_eq!(alpha.low_sends, 1);

  let stored = svc
    .store()
    .query_campaigns_in_range(DateRange::single(day("2026-02-16")), SeedFilter::All)
    .await
    .unwrap();
  assert_eq!(stored.len(), 3);
  assert!(stored.iter().all(|r| r.campaign_name != "0216-tiny"));
  let seed = stored.iter().find(|r| r.statid == "3").unwrap();
  assert!(seed.is_seed);
}

#[tokio::test]
async fn history_is_written_once_and_live_is_overwritten() {
  let campaigns = FakeCampaigns::default();
  campaigns.set("beta", vec![]);
  let svc = two_tenants(campaigns.clone()).await;
  let alpha = svc.store().get_tenant("alpha").await.unwrap().unwrap();

  // Already cached historical campaign.
  let old = detail("h1", "0212-old", "2026-02-12", 100);
  svc
    .store()
    .record_campaign(alpha.id, &old.to_new_campaign(), &old.metrics)
    .await
    .unwrap();

  campaigns.set(
    "alpha",
    vec![
      detail("h1", "0212-old", "2026-02-12", 5000),
      detail("h2", "0212-new", "2026-02-12", 200),
      detail("l1", "0215-live", "2026-02-15", 300),
    ],
  );
  let report = svc.sync_campaigns(range("2026-02-12", "2026-02-16")).await.unwrap();

  // History is cached, so only the live part drives the fetch.
  assert_eq!(report.fetch.unwrap().start, day("2026-02-13"));
  let summary = &report.tenants.iter().find(|t| t.code == "alpha").unwrap();
  assert_eq!(summary.updated, 2);
  assert_eq!(summary.skipped, 1);

  let h1 = svc.store().get_campaign_by_statid(alpha.id, "h1").await.unwrap().unwrap();
  let rows = svc
    .store()
    .query_campaigns_in_range(DateRange::single(h1.date), SeedFilter::All)
    .await
    .unwrap();
  let cached = rows.iter().find(|r| r.statid == "h1").unwrap();
  assert_eq!(cached.metrics.sends, 100);
  assert!(rows.iter().any(|r| r.statid == "h2"));

  // A second pass refreshes the live campaign in place.
  campaigns.set("alpha", vec![detail("l1", "0215-live", "2026-02-15", 450)]);
  svc.sync_campaigns(range("2026-02-12", "2026-02-16")).await.unwrap();
  let live = svc
    .store()
    .query_campaigns_in_range(DateRange::single(day("2026-02-15")), SeedFilter::All)
    .await
    .unwrap();
  assert_eq!(live.len(), 1);
  assert_eq!(live[0].metrics.sends, 450);
}

#[tokio::test]
async fn tenant_failure_is_isolated() {
  let campaigns = FakeCampaigns::default();
  campaigns.set("alpha", vec![detail("1", "0216-a", "2026-02-16", 100)]);
  // No entry for beta: its fetch fails.
  let svc = two_tenants(campaigns.clone()).await;

  let report = svc.sync_today().await.unwrap();

  assert!(report.success);
  assert_eq!(report.total_campaigns, 1);
  assert_eq!(report.tenants.len(), 1);
  assert_eq!(report.errors.len(), 1);
  assert_eq!(report.errors[0].tenant, "Beta");
  assert!(report.errors[0].campaign_id.is_none());
  assert!(report.errors[0].error.contains("Invalid token"));
}

#[tokio::test]
async fn campaign_write_failure_is_isolated() {
  let campaigns = FakeCampaigns::default();
  campaigns.set(
    "alpha",
    vec![
      detail("1", "0216-a", "2026-02-16", 100),
      detail("2", "0216-b", "2026-02-16", 100),
      detail("3", "0215-c", "2026-02-15", 100),
    ],
  );
  campaigns.set("beta", vec![]);
  let store = Arc::new(FlakyStore {
    inner:       SqliteStore::open_in_memory().await.unwrap(),
    fail_statid: "2".to_owned(),
  });
  let settings = SyncSettings {
    tenants: vec![tenant_cfg("alpha", "Alpha", true), tenant_cfg("beta", "Beta", true)],
    ..SyncSettings::default()
  };
  let svc = SyncService::new(Arc::clone(&store), campaigns, FakeRevenue::default(), settings)
    .with_clock(Arc::new(FixedClock(noon())));
  svc.reconcile_tenants().await.unwrap();

  let report = svc.sync_live_days().await.unwrap();

  assert!(report.success);
  assert_eq!(report.errors.len(), 1);
  assert_eq!(report.errors[0].tenant, "Alpha");
  assert_eq!(report.errors[0].campaign_id.as_deref(), Some("nl-2"));
  assert!(report.errors[0].error.contains("disk I/O error"));

  let alpha_summary = report.tenants.iter().find(|t| t.code == "alpha").unwrap();
  assert_eq!(alpha_summary.updated, 2);

  let alpha = store.get_tenant("alpha").await.unwrap().unwrap();
  for statid in ["1", "3"] {
    assert!(store.get_campaign_by_statid(alpha.id, statid).await.unwrap().is_some());
  }
  assert!(store.get_campaign_by_statid(alpha.id, "2").await.unwrap().is_none());
}

// ─── Revenue ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn revenue_sync_respects_cache_window() {
  let revenue = FakeRevenue {
    rows: vec![source("mta-b_0216-a", 10.0), source("", 3.0)],
    ..FakeRevenue::default()
  };
  let now = Utc::now();
  let svc = service_with(vec![], FakeCampaigns::default(), revenue.clone(), now).await;
  let date = day("2026-02-16");

  let first = svc.sync_revenue(date, false).await;
  assert!(first.success);
  assert!(!first.cached);
  assert_eq!(first.sources, 1);

  let second = svc.sync_revenue(date, false).await;
  assert!(second.cached);
  assert_eq!(second.sources, 1);
  assert_eq!(revenue.calls.load(Ordering::SeqCst), 1);

  let forced = svc.sync_revenue(date, true).await;
  assert!(!forced.cached);
  assert_eq!(revenue.calls.load(Ordering::SeqCst), 2);

  // The same store seen 31 minutes later is stale.
  let later = SyncService::new(
    svc.store().clone(),
    FakeCampaigns::default(),
    revenue.clone(),
    SyncSettings::default(),
  )
  .with_clock(Arc::new(FixedClock(now + Duration::minutes(31))));
  let stale = later.sync_revenue(date, false).await;
  assert!(!stale.cached);
  assert_eq!(revenue.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn revenue_failure_is_reported_not_raised() {
  let revenue = FakeRevenue {
    fail: true,
    ..FakeRevenue::default()
  };
  let svc = service_with(vec![], FakeCampaigns::default(), revenue, noon()).await;

  let outcome = svc.sync_revenue(day("2026-02-16"), true).await;
  assert!(!outcome.success);
  assert!(outcome.error.unwrap().contains("BAD_PASSWORD"));
}

#[tokio::test]
async fn live_revenue_runs_newest_first() {
  let revenue = FakeRevenue::default();
  let svc = service_with(vec![], FakeCampaigns::default(), revenue.clone(), noon()).await;

  let outcomes = svc.sync_live_revenue(true).await;
  let dates: Vec<NaiveDate> = outcomes.iter().map(|o| o.date).collect();
  assert_eq!(dates, vec![day("2026-02-16"), day("2026-02-15"), day("2026-02-14")]);
  assert_eq!(revenue.calls.load(Ordering::SeqCst), 3);

  let ranged = svc.sync_revenue_range(range("2026-02-01", "2026-02-02"), true).await;
  assert_eq!(ranged.len(), 2);
}

// ─── Read path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn grouped_read_attaches_matched_revenue() {
  let campaigns = FakeCampaigns::default();
  campaigns.set(
    "alpha",
    vec![
      detail("1", "0216-cfl-e3", "2026-02-16", 1000),
      detail("2", "0216-cfl-e4", "2026-02-16", 1000),
      detail("3", "0216-seed", "2026-02-16", 100),
    ],
  );
  campaigns.set("beta", vec![]);
  let svc = two_tenants(campaigns).await;
  svc.sync_today().await.unwrap();

  svc
    .store()
    .upsert_revenue_sources(
      day("2026-02-16"),
      &[source("mta-b_0216-cfl-e3", 20.0), source("source2-0216-cfl-e3", 5.0)],
    )
    .await
    .unwrap();

  let reports = svc.today_campaigns().await.unwrap();
  assert_eq!(reports.len(), 1);
  let alpha = &reports[0];
  assert_eq!(alpha.code, "alpha");
  assert_eq!(alpha.campaigns.len(), 2);

  let e3 = alpha
    .campaigns
    .iter()
    .find(|c| c.campaign_name == "0216-cfl-e3")
    .unwrap();
  assert_eq!(e3.revenue, 25.0);
  assert_eq!(e3.conversions, 4);
  assert_eq!(e3.visitors, 60);
  // 100 clicks, 1000 sends.
  assert_eq!(e3.epc, 0.25);
  assert_eq!(e3.ecpm, 25.0);

  let e4 = alpha
    .campaigns
    .iter()
    .find(|c| c.campaign_name == "0216-cfl-e4")
    .unwrap();
  assert_eq!(e4.revenue, 0.0);
  assert_eq!(e4.epc, 0.0);

  assert_eq!(alpha.totals.revenue, 25.0);
  assert_eq!(alpha.totals.sends, 2000);

  let seeds = svc.today_seed_campaigns().await.unwrap();
  assert_eq!(seeds.len(), 1);
  assert_eq!(seeds[0].campaigns.len(), 1);
  assert_eq!(seeds[0].campaigns[0].campaign_name, "0216-seed");
}

// ─── Maintenance and admin ───────────────────────────────────────────────────

#[tokio::test]
async fn cleanup_prunes_by_utc_age() {
  let svc = two_tenants(FakeCampaigns::default()).await;
  let alpha = svc.store().get_tenant("alpha").await.unwrap().unwrap();
  for (statid, date) in [("old", "2026-01-10"), ("new", "2026-02-10")] {
    let d = detail(statid, statid, date, 100);
    svc
      .store()
      .record_campaign(alpha.id, &d.to_new_campaign(), &d.metrics)
      .await
      .unwrap();
  }
  svc
    .store()
    .upsert_revenue_sources(day("2026-01-10"), &[source("mta-old", 1.0)])
    .await
    .unwrap();

  let counts = svc.cleanup(30).await.unwrap();
  assert_eq!(counts.cutoff_date, day("2026-01-17"));
  assert_eq!(counts.campaigns, 1);
  assert_eq!(counts.campaign_stats, 1);
  assert_eq!(counts.revenue_sources, 1);
  assert!(svc.store().get_campaign_by_statid(alpha.id, "new").await.unwrap().is_some());
}

#[tokio::test]
async fn cleanup_with_huge_retention_clamps_the_cutoff() {
  let svc = two_tenants(FakeCampaigns::default()).await;
  let counts = svc.cleanup(u32::MAX).await.unwrap();
  assert_eq!(counts.cutoff_date, NaiveDate::MIN);
  assert_eq!(counts.campaigns, 0);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
  let svc = two_tenants(FakeCampaigns::default()).await;
  assert_eq!(svc.reconcile_tenants().await.unwrap(), 3);
  assert_eq!(svc.list_tenants(false).await.unwrap().len(), 3);
  assert_eq!(svc.list_tenants(true).await.unwrap().len(), 2);
}

#[tokio::test]
async fn tenant_admin_rejects_duplicates_and_blanks() {
  let svc = two_tenants(FakeCampaigns::default()).await;

  let dup = svc.create_tenant(tenant_cfg("alpha", "Again", true)).await;
  assert!(matches!(dup, Err(SyncError::DuplicateTenant(code)) if code == "alpha"));

  let mut blank = tenant_cfg("delta", "Delta", true);
  blank.usertoken = " ".into();
  blank.le_domain = String::new();
  match svc.create_tenant(blank).await {
    Err(SyncError::MissingFields(fields)) => assert_eq!(fields, vec!["usertoken", "le_domain"]),
    other => panic!("unexpected: {other:?}"),
  }

  let delta = svc.create_tenant(tenant_cfg("delta", "Delta", true)).await.unwrap();
  let rename = TenantPatch {
    code: Some("beta".into()),
    ..TenantPatch::default()
  };
  assert!(matches!(
    svc.update_tenant(delta.id, rename).await,
    Err(SyncError::DuplicateTenant(_))
  ));

  let keep_code = TenantPatch {
    code: Some("delta".into()),
    name: Some("Delta Prime".into()),
    ..TenantPatch::default()
  };
  let updated = svc.update_tenant(delta.id, keep_code).await.unwrap().unwrap();
  assert_eq!(updated.name, "Delta Prime");

  assert!(svc.update_tenant(9999, TenantPatch::default()).await.unwrap().is_none());
  assert!(svc.delete_tenant(delta.id).await.unwrap());
  assert!(svc.get_tenant(delta.id).await.unwrap().is_none());
}
