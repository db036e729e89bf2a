//! Read-only endpoints, served from the store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/health` | Public |
//! | `GET`  | `/api/me` | The authenticated user |
//! | `GET`  | `/api/today` | Today's regular campaigns |
//! | `GET`  | `/api/range` | `?startDate&endDate` |
//! | `GET`  | `/api/seeds/today` | Today's seed campaigns |
//! | `GET`  | `/api/seeds/range` | `?startDate&endDate` |
//! | `GET`  | `/api/domains` | All tenants |

use axum::{
  Json,
  extract::{Query, State},
};
use campdash_core::campaign::SeedFilter;
use campdash_sync::Dashboard;
use chrono::Utc;
use serde_json::{Value, json};

use crate::{AppState, RangeParams, auth::CurrentUser, error::ApiError};

/// `GET /api/health`
pub async fn health<D: Dashboard + 'static>(State(state): State<AppState<D>>) -> Json<Value> {
  let tz = state.dashboard.timezone();
  let now = Utc::now().with_timezone(&tz);
  Json(json!({
    "success": true,
    "status": "running",
    "timestamp": now.format("%Y-%m-%d %H:%M:%S").to_string(),
    "timezone": tz.name(),
  }))
}

/// `GET /api/me`
pub async fn me(user: CurrentUser) -> Json<Value> {
  Json(json!({ "success": true, "username": user.username, "role": user.role }))
}

// ─── Campaign views ───────────────────────────────────────────────────────────

async fn today_view<D: Dashboard + 'static>(
  state: &AppState<D>,
  seeds: SeedFilter,
) -> Result<Json<Value>, ApiError> {
  let date = state.dashboard.today();
  let domains = match seeds {
    SeedFilter::Only => state.dashboard.today_seed_campaigns().await?,
    _ => state.dashboard.today_campaigns().await?,
  };
  Ok(Json(json!({
    "success": true,
    "date": date,
    "timezone": state.dashboard.timezone().name(),
    "domains": domains,
  })))
}

async fn range_view<D: Dashboard + 'static>(
  state: &AppState<D>,
  params: &RangeParams,
  seeds: SeedFilter,
) -> Result<Json<Value>, ApiError> {
  let range = params.range()?;
  let domains = state.dashboard.campaigns_grouped(range, seeds).await?;
  Ok(Json(json!({
    "success": true,
    "startDate": range.start(),
    "endDate": range.end(),
    "timezone": state.dashboard.timezone().name(),
    "domains": domains,
  })))
}

/// `GET /api/today`
pub async fn today<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
) -> Result<Json<Value>, ApiError> {
  today_view(&state, SeedFilter::Exclude).await
}

/// `GET /api/seeds/today`
pub async fn seeds_today<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
) -> Result<Json<Value>, ApiError> {
  today_view(&state, SeedFilter::Only).await
}

/// `GET /api/range?startDate=…&endDate=…`
pub async fn range<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
  range_view(&state, &params, SeedFilter::Exclude).await
}

/// `GET /api/seeds/range?startDate=…&endDate=…`
pub async fn seeds_range<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
  range_view(&state, &params, SeedFilter::Only).await
}

/// `GET /api/domains`
pub async fn domains<D: Dashboard + 'static>(
  _user: CurrentUser,
  State(state): State<AppState<D>>,
) -> Result<Json<Value>, ApiError> {
  let tenants = state.dashboard.list_tenants(false).await?;
  Ok(Json(json!({ "success": true, "domains": tenants })))
}
