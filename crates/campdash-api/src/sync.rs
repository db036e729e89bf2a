//! Endpoints that call the upstream platforms and write to the store.
//!
//! Campaign syncs also force a revenue refresh for the same days. A sync
//! whose tenants partly failed still answers `200` with the failures listed
//! under `errors`; only an aborted run is a `500`.

use axum::{
  Json,
  extract::{Query, State},
};
use campdash_core::window::parse_date;
use campdash_sync::{Dashboard, RevenueSync, SyncReport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  AppState, RangeParams,
  auth::{CurrentUser, SuperUser},
  error::ApiError,
};

/// A campaign sync report with the revenue refreshes run alongside it.
#[derive(Debug, Serialize)]
pub struct SyncResponse<R> {
  #[serde(flatten)]
  pub report:       SyncReport,
  pub revenue_sync: R,
}

/// `POST /api/sync/today`
pub async fn today<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
) -> Result<Json<SyncResponse<RevenueSync>>, ApiError> {
  let report = state.dashboard.sync_today().await?;
  let revenue_sync = state.dashboard.sync_revenue(state.dashboard.today(), true).await;
  Ok(Json(SyncResponse { report, revenue_sync }))
}

/// `POST /api/sync/range?startDate=…&endDate=…`
pub async fn range<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<SyncResponse<Vec<RevenueSync>>>, ApiError> {
  let range = params.range()?;
  let report = state.dashboard.sync_campaigns(range).await?;
  let revenue_sync = state.dashboard.sync_revenue_range(range, true).await;
  Ok(Json(SyncResponse { report, revenue_sync }))
}

/// `POST /api/sync/live`
pub async fn live<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
) -> Result<Json<SyncResponse<Vec<RevenueSync>>>, ApiError> {
  let report = state.dashboard.sync_live_days().await?;
  let revenue_sync = state.dashboard.sync_live_revenue(true).await;
  Ok(Json(SyncResponse { report, revenue_sync }))
}

#[derive(Debug, Deserialize)]
pub struct RevenueParams {
  pub date: Option<String>,
}

/// `POST /api/sync/revenue[?date=YYYY-MM-DD]`. Defaults to today.
pub async fn revenue<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
  Query(params): Query<RevenueParams>,
) -> Result<Json<RevenueSync>, ApiError> {
  let date = match params.date.as_deref().filter(|d| !d.is_empty()) {
    Some(d) => parse_date(d).map_err(|e| ApiError::BadRequest(e.to_string()))?,
    None => state.dashboard.today(),
  };
  Ok(Json(state.dashboard.sync_revenue(date, true).await))
}

/// `POST /api/cleanup`
pub async fn cleanup<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
) -> Result<Json<Value>, ApiError> {
  let counts = state.dashboard.cleanup(state.retention_days).await?;
  Ok(Json(json!({
    "success": true,
    "campaigns": counts.campaigns,
    "campaign_stats": counts.campaign_stats,
    "revenue_sources": counts.revenue_sources,
    "cutoff_date": counts.cutoff_date,
  })))
}
