//! Tenant administration. All routes require the `super` role.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/admin/domains` | `?search=&page=`, 15 per page |
//! | `POST`   | `/api/admin/domains` | 400 on blank fields, 409 on a taken code |
//! | `GET`    | `/api/admin/domains/{id}` | 404 if not found |
//! | `PUT`    | `/api/admin/domains/{id}` | Partial update |
//! | `DELETE` | `/api/admin/domains/{id}` | Cascades to campaigns |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use campdash_core::tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery};
use campdash_sync::Dashboard;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{AppState, auth::SuperUser, error::ApiError};

const PER_PAGE: u32 = 15;

#[derive(Debug, Serialize)]
pub struct TenantBody {
  pub success: bool,
  pub domain:  Tenant,
}

impl From<Tenant> for TenantBody {
  fn from(domain: Tenant) -> Self { Self { success: true, domain } }
}

fn not_found(id: i64) -> ApiError { ApiError::NotFound(format!("tenant {id} not found")) }

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search: Option<String>,
  pub page:   Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListBody {
  pub success: bool,
  #[serde(flatten)]
  pub page:    TenantPage,
}

/// `GET /api/admin/domains[?search=…&page=…]`
pub async fn list<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListBody>, ApiError> {
  let query = TenantQuery {
    search: params.search.filter(|s| !s.trim().is_empty()),
    page: params.page.unwrap_or(1).max(1),
    per_page: PER_PAGE,
    include_disabled: true,
  };
  let page = state.dashboard.list_tenants_admin(query).await?;
  Ok(Json(ListBody { success: true, page }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Body of `POST /api/admin/domains`. Absent fields read as blank so that
/// they are reported together.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub code:      String,
  #[serde(default)]
  pub name:      String,
  #[serde(default)]
  pub api_url:   String,
  #[serde(default)]
  pub username:  String,
  #[serde(default)]
  pub usertoken: String,
  #[serde(default)]
  pub le_domain: String,
  pub phase:     Option<i64>,
  pub enabled:   Option<bool>,
}

impl From<CreateBody> for TenantConfig {
  fn from(b: CreateBody) -> Self {
    TenantConfig {
      code:      b.code.trim().to_owned(),
      name:      b.name.trim().to_owned(),
      api_url:   b.api_url.trim().to_owned(),
      username:  b.username.trim().to_owned(),
      usertoken: b.usertoken.trim().to_owned(),
      le_domain: b.le_domain.trim().to_owned(),
      phase:     b.phase.unwrap_or(2),
      enabled:   b.enabled.unwrap_or(true),
    }
  }
}

/// `POST /api/admin/domains`
pub async fn create<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<TenantBody>, ApiError> {
  let tenant = state.dashboard.create_tenant(body.into()).await?;
  Ok(Json(tenant.into()))
}

// ─── One tenant ───────────────────────────────────────────────────────────────

/// `GET /api/admin/domains/{id}`
pub async fn get_one<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
  Path(id): Path<i64>,
) -> Result<Json<TenantBody>, ApiError> {
  let tenant = state.dashboard.get_tenant(id).await?.ok_or_else(|| not_found(id))?;
  Ok(Json(tenant.into()))
}

/// `PUT /api/admin/domains/{id}`
pub async fn update<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
  Path(id): Path<i64>,
  Json(patch): Json<TenantPatch>,
) -> Result<Json<TenantBody>, ApiError> {
  let tenant = state
    .dashboard
    .update_tenant(id, patch)
    .await?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(tenant.into()))
}

/// `DELETE /api/admin/domains/{id}`
pub async fn delete_one<D: Dashboard + 'static>(
  _user: SuperUser,
  State(state): State<AppState<D>>,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  if !state.dashboard.delete_tenant(id).await? {
    return Err(not_found(id));
  }
  Ok(Json(json!({ "success": true, "message": "Tenant deleted" })))
}
