//! Route tests via `tower::ServiceExt::oneshot` against a real orchestrator
//! over an in-memory store.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use campdash_core::{
  campaign::{CampaignDetail, CampaignMetrics},
  revenue::SourceRow,
  tenant::{Tenant, TenantConfig},
};
use campdash_store_sqlite::SqliteStore;
use campdash_sync::{Dashboard, SyncService, SyncSettings, clock::FixedClock};
use campdash_upstream::{CampaignSource, Lookback, RevenueFeed};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, AuthConfig, Role, UserConfig, api_router};

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Every tenant sent one campaign today.
struct OneCampaign;

impl CampaignSource for OneCampaign {
  async fn full_campaign_stats(
    &self,
    tenant: &Tenant,
    _lookback: Lookback,
  ) -> campdash_upstream::Result<Vec<CampaignDetail>> {
    Ok(vec![CampaignDetail {
      campaign_id:   "77".into(),
      statid:        format!("{}-1", tenant.code),
      campaign_name: "0216-cfl-e3".into(),
      date:          NaiveDate::from_ymd_opt(2026, 2, 16).unwrap(),
      time:          NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
      metrics:       CampaignMetrics::from_counts(2000, 500, 80, 4, 2),
    }])
  }
}

struct FlatRevenue;

impl RevenueFeed for FlatRevenue {
  async fn sources(
    &self,
    _from: NaiveDate,
    _to: NaiveDate,
  ) -> campdash_upstream::Result<Vec<SourceRow>> {
    Ok(vec![SourceRow {
      source: "mta-b_0216-cfl-e3".into(),
      visitors: 40,
      total_leads: 6,
      sold_leads: 3,
      total_revenue: 16.0,
      ..SourceRow::default()
    }])
  }
}

fn hash(password: &str) -> String {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
}

async fn app() -> Router {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let settings = SyncSettings {
    tenants: vec![TenantConfig {
      code:      "alpha".into(),
      name:      "Alpha".into(),
      api_url:   "https://upstream.example/xml.php".into(),
      username:  "alpha-user".into(),
      usertoken: "secret".into(),
      le_domain: "alpha.example".into(),
      phase:     2,
      enabled:   true,
    }],
    ..SyncSettings::default()
  };
  // 12:00 in New York.
  let now = Utc.with_ymd_and_hms(2026, 2, 16, 17, 0, 0).unwrap();
  let dashboard = SyncService::new(store, OneCampaign, FlatRevenue, settings)
    .with_clock(Arc::new(FixedClock(now)));
  dashboard.reconcile_tenants().await.unwrap();

  api_router(AppState {
    dashboard:      Arc::new(dashboard),
    auth:           Arc::new(AuthConfig {
      users: vec![
        UserConfig {
          username:      "admin".into(),
          password_hash: hash("root-pass"),
          role:          Role::Super,
        },
        UserConfig {
          username:      "viewer".into(),
          password_hash: hash("view-pass"),
          role:          Role::User,
        },
      ],
    }),
    retention_days: 30,
  })
}

fn basic(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

fn request(method: Method, uri: &str, auth: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = auth {
    builder = builder.header(header::AUTHORIZATION, basic(user, pass));
  }
  match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

const ADMIN: Option<(&str, &str)> = Some(("admin", "root-pass"));
const VIEWER: Option<(&str, &str)> = Some(("viewer", "view-pass"));

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_public() {
  let app = app().await;
  let (status, body) = call(&app, request(Method::GET, "/api/health", None, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "running");
  assert_eq!(body["timezone"], "America/New_York");
}

#[tokio::test]
async fn reports_require_credentials() {
  let app = app().await;
  let resp = app
    .clone()
    .oneshot(request(Method::GET, "/api/today", None, None))
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let (status, body) = call(
    &app,
    request(Method::GET, "/api/today", Some(("viewer", "nope")), None),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn me_reports_role() {
  let app = app().await;
  let (_, body) = call(&app, request(Method::GET, "/api/me", ADMIN, None)).await;
  assert_eq!(body["username"], "admin");
  assert_eq!(body["role"], "super");
}

#[tokio::test]
async fn admin_routes_need_super_role() {
  let app = app().await;
  let (status, _) = call(&app, request(Method::GET, "/api/admin/domains", VIEWER, None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&app, request(Method::POST, "/api/cleanup", VIEWER, None)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(&app, request(Method::GET, "/api/admin/domains", ADMIN, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total"], 1);
  assert_eq!(body["tenants"][0]["code"], "alpha");
  assert!(body["tenants"][0].get("usertoken").is_none());
}

// ─── Reports and sync ────────────────────────────────────────────────────────

#[tokio::test]
async fn range_params_are_validated() {
  let app = app().await;
  let (status, body) = call(&app, request(Method::GET, "/api/range", VIEWER, None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);

  let (status, _) = call(
    &app,
    request(Method::GET, "/api/range?startDate=2026-02-16&endDate=2026-02-01", VIEWER, None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &app,
    request(Method::GET, "/api/range?startDate=02/01/2026&endDate=2026-02-16", VIEWER, None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(
    &app,
    request(Method::GET, "/api/range?startDate=2026-02-01&endDate=2026-02-16", VIEWER, None),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["startDate"], "2026-02-01");
  assert_eq!(body["domains"], json!([]));
}

#[tokio::test]
async fn sync_today_then_read_with_revenue() {
  let app = app().await;
  let (status, body) = call(&app, request(Method::POST, "/api/sync/today", VIEWER, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["total_campaigns"], 1);
  assert_eq!(body["revenue_sync"]["success"], true);
  assert_eq!(body["revenue_sync"]["sources"], 1);

  let (status, body) = call(&app, request(Method::GET, "/api/today", VIEWER, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["date"], "2026-02-16");
  let campaign = &body["domains"][0]["campaigns"][0];
  assert_eq!(campaign["campaign_name"], "0216-cfl-e3");
  assert_eq!(campaign["sends"], 2000);
  assert_eq!(campaign["revenue"], 16.0);
  assert_eq!(campaign["conversions"], 3);
  assert_eq!(campaign["epc"], 0.2);
  assert_eq!(campaign["ecpm"], 8.0);
}

#[tokio::test]
async fn revenue_sync_accepts_optional_date() {
  let app = app().await;
  let (status, body) = call(
    &app,
    request(Method::POST, "/api/sync/revenue?date=2026-02-10", VIEWER, None),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["date"], "2026-02-10");
  assert_eq!(body["cached"], false);

  let (_, body) = call(&app, request(Method::POST, "/api/sync/revenue", VIEWER, None)).await;
  assert_eq!(body["date"], "2026-02-16");

  let (status, _) = call(
    &app,
    request(Method::POST, "/api/sync/revenue?date=yesterday", VIEWER, None),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cleanup_reports_counts() {
  let app = app().await;
  let (status, body) = call(&app, request(Method::POST, "/api/cleanup", ADMIN, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["campaigns"], 0);
  assert_eq!(body["cutoff_date"], "2026-01-17");
}

// ─── Tenant administration ───────────────────────────────────────────────────

#[tokio::test]
async fn tenant_crud() {
  let app = app().await;
  let new_tenant = json!({
    "code": "beta", "name": "Beta", "api_url": "https://upstream.example/xml.php",
    "username": "beta-user", "usertoken": "tok", "le_domain": "beta.example"
  });

  let (status, body) = call(
    &app,
    request(Method::POST, "/api/admin/domains", ADMIN, Some(new_tenant.clone())),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let id = body["domain"]["id"].as_i64().unwrap();
  assert_eq!(body["domain"]["phase"], 2);

  let (status, body) = call(
    &app,
    request(Method::POST, "/api/admin/domains", ADMIN, Some(new_tenant)),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);

  let (status, body) = call(
    &app,
    request(Method::POST, "/api/admin/domains", ADMIN, Some(json!({ "code": "x" }))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("api_url"));

  let (status, body) = call(
    &app,
    request(
      Method::PUT,
      &format!("/api/admin/domains/{id}"),
      ADMIN,
      Some(json!({ "name": "Beta Two", "enabled": false })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["domain"]["name"], "Beta Two");
  assert_eq!(body["domain"]["enabled"], false);

  let uri = format!("/api/admin/domains/{id}");
  let (status, _) = call(&app, request(Method::DELETE, &uri, ADMIN, None)).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = call(&app, request(Method::GET, &uri, ADMIN, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
  let (status, _) = call(&app, request(Method::DELETE, &uri, ADMIN, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
