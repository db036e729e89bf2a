//! JSON API for the campaign dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`campdash_sync::Dashboard`].
//! Every response carries a `success` flag. Everything except
//! `/api/health` requires HTTP Basic auth, and the admin and cleanup routes
//! require the `super` role.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = campdash_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod reports;
pub mod sync;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use campdash_core::window::{DateRange, parse_date};
use campdash_sync::Dashboard;
use serde::Deserialize;

pub use auth::{AuthConfig, Role, UserConfig};
pub use error::ApiError;

/// Shared handler state.
pub struct AppState<D> {
  pub dashboard:      Arc<D>,
  pub auth:           Arc<AuthConfig>,
  /// Age limit applied by `POST /api/cleanup`.
  pub retention_days: u32,
}

impl<D> Clone for AppState<D> {
  fn clone(&self) -> Self {
    Self {
      dashboard:      Arc::clone(&self.dashboard),
      auth:           Arc::clone(&self.auth),
      retention_days: self.retention_days,
    }
  }
}

/// Build the `/api` router for `state`.
pub fn api_router<D>(state: AppState<D>) -> Router<()>
where
  D: Dashboard + 'static,
{
  Router::new()
    .route("/api/health", get(reports::health::<D>))
    .route("/api/me", get(reports::me))
    // Reports
    .route("/api/today", get(reports::today::<D>))
    .route("/api/range", get(reports::range::<D>))
    .route("/api/seeds/today", get(reports::seeds_today::<D>))
    .route("/api/seeds/range", get(reports::seeds_range::<D>))
    .route("/api/domains", get(reports::domains::<D>))
    // Sync
    .route("/api/sync/today", post(sync::today::<D>))
    .route("/api/sync/range", post(sync::range::<D>))
    .route("/api/sync/live", post(sync::live::<D>))
    .route("/api/sync/revenue", post(sync::revenue::<D>))
    .route("/api/cleanup", post(sync::cleanup::<D>))
    // Tenant administration
    .route(
      "/api/admin/domains",
      get(admin::list::<D>).post(admin::create::<D>),
    )
    .route(
      "/api/admin/domains/{id}",
      get(admin::get_one::<D>)
        .put(admin::update::<D>)
        .delete(admin::delete_one::<D>),
    )
    .with_state(state)
}

/// `?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

impl RangeParams {
  pub fn range(&self) -> Result<DateRange, ApiError> {
    let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
      return Err(ApiError::BadRequest(
        "startDate and endDate are required".to_owned(),
      ));
    };
    let start = parse_date(start).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let end = parse_date(end).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    DateRange::new(start, end).map_err(|e| ApiError::BadRequest(e.to_string()))
  }
}

#[cfg(test)]
mod tests;
