//! The `ReportStore` trait.
//!
//! Implemented by storage backends (e.g. `campdash-store-sqlite`). The sync
//! orchestrator and the API depend on this abstraction, not on a concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
  campaign::{Campaign, CampaignMetrics, CampaignRow, NewCampaign, SeedFilter},
  revenue::{SourceRow, StoredSource},
  tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery},
  window::DateRange,
};

/// Rows removed by [`ReportStore::delete_older_than`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupCounts {
  pub campaigns:       u64,
  pub campaign_stats:  u64,
  pub revenue_sources: u64,
  pub cutoff_date:     NaiveDate,
}

/// Abstraction over the dashboard's cache.
///
/// A campaign and its stat are always written together: use
/// [`ReportStore::record_campaign`] unless the caller already holds the
/// campaign id.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ReportStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tenants ───────────────────────────────────────────────────────────

  /// Look a tenant up by its unique code.
  fn get_tenant<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + 'a;

  fn get_tenant_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + '_;

  /// All tenants ordered by name, optionally only the enabled ones.
  fn list_tenants(
    &self,
    enabled_only: bool,
  ) -> impl Future<Output = Result<Vec<Tenant>, Self::Error>> + Send + '_;

  /// Paginated, searchable listing for administration.
  fn list_tenants_admin<'a>(
    &'a self,
    query: &'a TenantQuery,
  ) -> impl Future<Output = Result<TenantPage, Self::Error>> + Send + 'a;

  /// Insert or update the tenant with `config.code`. Idempotent.
  fn upsert_tenant<'a>(
    &'a self,
    config: &'a TenantConfig,
  ) -> impl Future<Output = Result<Tenant, Self::Error>> + Send + 'a;

  /// Insert a new tenant. Fails if the code is already taken.
  fn create_tenant<'a>(
    &'a self,
    config: &'a TenantConfig,
  ) -> impl Future<Output = Result<Tenant, Self::Error>> + Send + 'a;

  /// Apply a partial update. Returns `None` if `id` does not exist; fails if
  /// the patch renames the tenant to a code that is already taken.
  fn update_tenant<'a>(
    &'a self,
    id: i64,
    patch: &'a TenantPatch,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + 'a;

  /// Delete a tenant and, by cascade, all its campaigns and stats.
  /// Returns `false` if it did not exist.
  fn delete_tenant(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Campaigns ─────────────────────────────────────────────────────────

  /// Create or update the campaign keyed by `(tenant_id, statid)` and return
  /// its row id.
  fn upsert_campaign<'a>(
    &'a self,
    tenant_id: i64,
    campaign: &'a NewCampaign,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Replace the stat row of `campaign_id` wholesale.
  fn upsert_campaign_stat<'a>(
    &'a self,
    campaign_id: i64,
    metrics: &'a CampaignMetrics,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// [`upsert_campaign`](Self::upsert_campaign) and
  /// [`upsert_campaign_stat`](Self::upsert_campaign_stat) in one atomic step.
  fn record_campaign<'a>(
    &'a self,
    tenant_id: i64,
    campaign: &'a NewCampaign,
    metrics: &'a CampaignMetrics,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  fn get_campaign_by_statid<'a>(
    &'a self,
    tenant_id: i64,
    statid: &'a str,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + 'a;

  /// Number of campaigns, of any tenant, dated within `range`.
  fn count_campaigns_in_range(
    &self,
    range: DateRange,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Campaigns of enabled tenants dated within `range`, joined with their
  /// stats, ordered by tenant name, then date and time descending.
  fn query_campaigns_in_range(
    &self,
    range: DateRange,
    seeds: SeedFilter,
  ) -> impl Future<Output = Result<Vec<CampaignRow>, Self::Error>> + Send + '_;

  // ── Revenue ───────────────────────────────────────────────────────────

  /// Upsert every row keyed by `(source, date)` in one transaction. Rows with
  /// an empty source name are skipped. Returns the number written.
  fn upsert_revenue_sources<'a>(
    &'a self,
    date: NaiveDate,
    rows: &'a [SourceRow],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn query_revenue_sources_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<StoredSource>, Self::Error>> + Send + '_;

  /// Newest `fetched_at` among the rows for `date`.
  fn last_revenue_sync(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DateTime<Utc>>, Self::Error>> + Send + '_;

  // ── Retention ─────────────────────────────────────────────────────────

  /// Remove campaigns (with their stats) and revenue rows dated strictly
  /// before `cutoff`.
  fn delete_older_than(
    &self,
    cutoff: NaiveDate,
  ) -> impl Future<Output = Result<CleanupCounts, Self::Error>> + Send + '_;
}
