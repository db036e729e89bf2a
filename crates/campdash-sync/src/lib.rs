//! Sync orchestration for the campaign dashboard.
//!
//! [`SyncService`] decides which dates need fetching, fans out over the
//! enabled tenants, classifies and stores what comes back, keeps the revenue
//! cache warm and assembles the grouped read model. The HTTP layer talks to
//! it through the [`Dashboard`] trait.

pub mod classify;
pub mod clock;
pub mod error;
pub mod report;
pub mod service;

use std::future::Future;

use chrono::NaiveDate;
use chrono_tz::Tz;
use campdash_core::{
  campaign::SeedFilter,
  report::TenantReport,
  store::CleanupCounts,
  tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery},
  window::DateRange,
};

pub use error::{Result, SyncError};
pub use report::{RevenueSync, SyncReport};
pub use service::{SyncService, SyncSettings};

/// Everything the HTTP layer can ask of the orchestrator.
pub trait Dashboard: Send + Sync {
  /// Zone in which "today" and send times are reckoned.
  fn timezone(&self) -> Tz;

  /// Today's date in [`timezone`](Self::timezone).
  fn today(&self) -> NaiveDate;

  // ── Campaign sync ─────────────────────────────────────────────────────

  /// Bring the store up to date for `range`.
  ///
  /// Fails only when the fetch decision itself cannot be made; upstream and
  /// per-campaign failures are listed in the report.
  fn sync_campaigns(
    &self,
    range: DateRange,
  ) -> impl Future<Output = Result<SyncReport>> + Send + '_;

  fn sync_today(&self) -> impl Future<Output = Result<SyncReport>> + Send + '_;

  /// Sync every day of the live window, today included.
  fn sync_live_days(&self) -> impl Future<Output = Result<SyncReport>> + Send + '_;

  // ── Revenue sync ──────────────────────────────────────────────────────

  /// Refresh the revenue rows for `date` unless they are fresh and `force`
  /// is unset.
  fn sync_revenue(
    &self,
    date: NaiveDate,
    force: bool,
  ) -> impl Future<Output = RevenueSync> + Send + '_;

  fn sync_revenue_range(
    &self,
    range: DateRange,
    force: bool,
  ) -> impl Future<Output = Vec<RevenueSync>> + Send + '_;

  /// Revenue for each day of the live window, newest first.
  fn sync_live_revenue(
    &self,
    force: bool,
  ) -> impl Future<Output = Vec<RevenueSync>> + Send + '_;

  // ── Read path ─────────────────────────────────────────────────────────

  fn campaigns_grouped(
    &self,
    range: DateRange,
    seeds: SeedFilter,
  ) -> impl Future<Output = Result<Vec<TenantReport>>> + Send + '_;

  fn today_campaigns(&self) -> impl Future<Output = Result<Vec<TenantReport>>> + Send + '_;

  fn today_seed_campaigns(
    &self,
  ) -> impl Future<Output = Result<Vec<TenantReport>>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Delete campaigns and revenue rows dated more than `days` days ago.
  fn cleanup(&self, days: u32) -> impl Future<Output = Result<CleanupCounts>> + Send + '_;

  /// Upsert every configured tenant. Returns how many were written.
  fn reconcile_tenants(&self) -> impl Future<Output = Result<usize>> + Send + '_;

  // ── Tenant administration ─────────────────────────────────────────────

  fn list_tenants(
    &self,
    enabled_only: bool,
  ) -> impl Future<Output = Result<Vec<Tenant>>> + Send + '_;

  fn list_tenants_admin(
    &self,
    query: TenantQuery,
  ) -> impl Future<Output = Result<TenantPage>> + Send + '_;

  fn get_tenant(&self, id: i64) -> impl Future<Output = Result<Option<Tenant>>> + Send + '_;

  /// Create a tenant; every credential field must be non-empty and the code
  /// unused.
  fn create_tenant(
    &self,
    config: TenantConfig,
  ) -> impl Future<Output = Result<Tenant>> + Send + '_;

  fn update_tenant(
    &self,
    id: i64,
    patch: TenantPatch,
  ) -> impl Future<Output = Result<Option<Tenant>>> + Send + '_;

  fn delete_tenant(&self, id: i64) -> impl Future<Output = Result<bool>> + Send + '_;
}

#[cfg(test)]
mod tests;
