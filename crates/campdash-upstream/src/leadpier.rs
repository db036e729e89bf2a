//! Client for the revenue platform's JSON API.
//!
//! Requests carry a bearer token obtained from a username/password login.
//! The token is cached in memory and, when `token_file` is set, on disk. A
//! 401 or 403 from the data endpoint triggers exactly one re-login and one
//! retry.

use std::{path::PathBuf, time::Duration};

use chrono::{NaiveDate, Utc};
use reqwest::{
  Client, Response, StatusCode,
  header::{ACCEPT, ORIGIN, REFERER},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use campdash_core::revenue::SourceRow;

use crate::{
  Result, RevenueFeed, UpstreamError,
  token::{CachedToken, TokenFile},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DASHBOARD_ORIGIN: &str = "https://dash.leadpier.com";
const DASHBOARD_REFERER: &str = "https://dash.leadpier.com/";
const PAGE_LIMIT: u32 = 1000;

// ─── Config ──────────────────────────────────────────────────────────────────

/// Revenue-platform settings, usually the `[leadpier]` table of the server
/// config.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadpierConfig {
  #[serde(default = "default_auth_url")]
  pub auth_url:           String,
  #[serde(default = "default_data_url")]
  pub data_url:           String,
  #[serde(default)]
  pub username:           String,
  #[serde(default)]
  pub password:           String,
  /// Where the token survives between runs. `None` keeps it in memory only;
  /// the server fills in a file beside its store.
  #[serde(default)]
  pub token_file:         Option<PathBuf>,
  #[serde(default = "default_token_expiry_hours")]
  pub token_expiry_hours: u32,
  /// How long a date's stored revenue is trusted before re-fetching.
  #[serde(default = "default_cache_minutes")]
  pub cache_minutes:      u32,
}

fn default_auth_url() -> String {
  "https://webapi.leadpier.com/v1/frontend/authenticate".to_owned()
}
fn default_data_url() -> String {
  "https://webapi.leadpier.com/v1/api/stats/user/org/sources".to_owned()
}
fn default_token_expiry_hours() -> u32 { 2 }
fn default_cache_minutes() -> u32 { 30 }

impl Default for LeadpierConfig {
  fn default() -> Self {
    Self {
      auth_url:           default_auth_url(),
      data_url:           default_data_url(),
      username:           String::new(),
      password:           String::new(),
      token_file:         None,
      token_expiry_hours: default_token_expiry_hours(),
      cache_minutes:      default_cache_minutes(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginRequest<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  #[serde(rename = "errorCode")]
  error_code: Option<String>,
  data:       Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
  token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourcesRequest {
  limit:           u32,
  offset:          u32,
  order_by:        &'static str,
  order_direction: &'static str,
  period_from:     String,
  period_to:       String,
}

#[derive(Deserialize)]
struct SourcesResponse {
  data: Option<SourcesData>,
}

#[derive(Deserialize)]
struct SourcesData {
  statistics: Option<Vec<WireSource>>,
}

/// One statistics row. Numeric columns arrive as numbers, numeric strings
/// or `null` depending on the account.
#[derive(Deserialize)]
struct WireSource {
  #[serde(default)]
  source:        Option<String>,
  #[serde(default, deserialize_with = "lenient_i64")]
  visitors:      i64,
  #[serde(default, rename = "totalLeads", deserialize_with = "lenient_i64")]
  total_leads:   i64,
  #[serde(default, rename = "soldLeads", deserialize_with = "lenient_i64")]
  sold_leads:    i64,
  #[serde(default, rename = "totalRevenue", deserialize_with = "lenient_f64")]
  total_revenue: f64,
  #[serde(default, rename = "EPL", deserialize_with = "lenient_f64")]
  epl:           f64,
  #[serde(default, rename = "EPV", deserialize_with = "lenient_f64")]
  epv:           f64,
}

impl From<WireSource> for SourceRow {
  fn from(w: WireSource) -> Self {
    SourceRow {
      source:        w.source.unwrap_or_default(),
      visitors:      w.visitors,
      total_leads:   w.total_leads,
      sold_leads:    w.sold_leads,
      total_revenue: w.total_revenue,
      epl:           w.epl,
      epv:           w.epv,
    }
  }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
  Ok(match Value::deserialize(d)? {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => s.trim().parse().unwrap_or(0.0),
    _ => 0.0,
  })
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
  Ok(match Value::deserialize(d)? {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .unwrap_or(0),
    Value::String(s) => {
      let s = s.trim();
      s.parse()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0)
    }
    _ => 0,
  })
}

// ─── Client ──────────────────────────────────────────────────────────────────

pub struct LeadpierClient {
  client: Client,
  config: LeadpierConfig,
  file:   Option<TokenFile>,
  token:  Mutex<Option<CachedToken>>,
}

impl LeadpierClient {
  /// Build the client and pick up a token left on disk by an earlier run.
  pub async fn new(config: LeadpierConfig) -> Result<Self> {
    Self::with_timeout(config, DEFAULT_TIMEOUT).await
  }

  pub async fn with_timeout(config: LeadpierConfig, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    let file = config.token_file.clone().map(TokenFile::new);
    let saved = match &file {
      Some(f) => f.load().await,
      None => None,
    };
    Ok(Self {
      client,
      config,
      file,
      token: Mutex::new(saved),
    })
  }

  fn max_token_age(&self) -> chrono::Duration {
    chrono::Duration::hours(i64::from(self.config.token_expiry_hours))
  }

  /// A token young enough to use, logging in when there is none.
  async fn token(&self) -> Result<String> {
    let mut cached = self.token.lock().await;
    let now = Utc::now();
    if let Some(t) = cached.as_ref().filter(|t| t.is_fresh(now, self.max_token_age())) {
      debug!("reusing cached revenue token");
      return Ok(t.token.clone());
    }
    let fresh = self.login().await?;
    let token = fresh.token.clone();
    *cached = Some(fresh);
    Ok(token)
  }

  /// Discard whatever is cached and log in again.
  async fn refresh_token(&self) -> Result<String> {
    let mut cached = self.token.lock().await;
    let fresh = self.login().await?;
    let token = fresh.token.clone();
    *cached = Some(fresh);
    Ok(token)
  }

  async fn login(&self) -> Result<CachedToken> {
    info!("authenticating with revenue platform");
    let resp = self
      .client
      .post(&self.config.auth_url)
      .header(ACCEPT, "application/json")
      .header(ORIGIN, DASHBOARD_ORIGIN)
      .header(REFERER, DASHBOARD_REFERER)
      .json(&LoginRequest {
        username: &self.config.username,
        password: &self.config.password,
      })
      .send()
      .await?;

    let status = resp.status();
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
      return Err(UpstreamError::Auth(format!("login refused with HTTP {status}")));
    }
    if !status.is_success() {
      return Err(UpstreamError::HttpStatus {
        status,
        url: self.config.auth_url.clone(),
      });
    }

    let body: LoginResponse = resp.json().await?;
    let code = body.error_code.unwrap_or_default();
    if code != "NO_ERROR" {
      return Err(UpstreamError::Auth(format!("login rejected: {code}")));
    }
    let token = body
      .data
      .and_then(|d| d.token)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| UpstreamError::Auth("login response carried no token".to_owned()))?;

    let cached = CachedToken::new(token, Utc::now());
    if let Some(file) = &self.file {
      file.save(&cached).await;
    }
    info!("revenue platform authentication successful");
    Ok(cached)
  }

  async fn post_sources(&self, token: &str, body: &SourcesRequest) -> Result<Response> {
    Ok(
      self
        .client
        .post(&self.config.data_url)
        .bearer_auth(token)
        .header(ACCEPT, "application/json")
        .header(ORIGIN, DASHBOARD_ORIGIN)
        .header(REFERER, DASHBOARD_REFERER)
        .json(body)
        .send()
        .await?,
    )
  }

  /// Source rows for `[from, to]`, highest revenue first.
  pub async fn get_sources(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SourceRow>> {
    let body = SourcesRequest {
      limit:           PAGE_LIMIT,
      offset:          0,
      order_by:        "totalRevenue",
      order_direction: "DESC",
      period_from:     from.format("%Y-%m-%d").to_string(),
      period_to:       to.format("%Y-%m-%d").to_string(),
    };

    let token = self.token().await?;
    let mut resp = self.post_sources(&token, &body).await?;

    if is_auth_rejection(resp.status()) {
      warn!(status = %resp.status(), "revenue token rejected, re-authenticating");
      let token = self.refresh_token().await?;
      resp = self.post_sources(&token, &body).await?;
      if is_auth_rejection(resp.status()) {
        return Err(UpstreamError::Auth(format!(
          "token rejected after re-login with HTTP {}",
          resp.status()
        )));
      }
    }

    let status = resp.status();
    if !status.is_success() {
      return Err(UpstreamError::HttpStatus {
        status,
        url: self.config.data_url.clone(),
      });
    }

    let parsed: SourcesResponse = resp.json().await?;
    let rows: Vec<SourceRow> = parsed
      .data
      .and_then(|d| d.statistics)
      .unwrap_or_default()
      .into_iter()
      .map(SourceRow::from)
      .collect();

    info!(%from, %to, sources = rows.len(), "revenue sources fetched");
    Ok(rows)
  }
}

fn is_auth_rejection(status: StatusCode) -> bool {
  matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

impl RevenueFeed for LeadpierClient {
  async fn sources(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<SourceRow>> {
    self.get_sources(from, to).await
  }
}
