//! Process wiring for the campaign dashboard: configuration and the daily
//! cleanup schedule. The binary in `main.rs` assembles the rest.

pub mod scheduler;

use std::path::PathBuf;

use campdash_api::{AuthConfig, UserConfig};
use campdash_core::tenant::TenantConfig;
use campdash_sync::SyncSettings;
use campdash_upstream::LeadpierConfig;
use chrono_tz::Tz;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `CAMPDASH_*` environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// IANA zone that defines "today" for every tenant.
  #[serde(default = "default_timezone")]
  pub timezone:               String,
  #[serde(default = "default_min_sends")]
  pub min_sends:              i64,
  #[serde(default = "default_live_days")]
  pub live_days:              u32,
  /// Parallel campaign-summary requests per tenant.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent_details: usize,
  #[serde(default = "default_retention_days")]
  pub retention_days:         u32,
  /// Local hour at which the daily cleanup runs.
  #[serde(default = "default_cleanup_hour")]
  pub cleanup_hour:           u32,
  #[serde(default)]
  pub leadpier:               LeadpierConfig,
  #[serde(default)]
  pub users:                  Vec<UserConfig>,
  #[serde(default)]
  pub tenants:                Vec<TenantConfig>,
}

fn default_host() -> String { "0.0.0.0".to_owned() }
fn default_port() -> u16 { 8001 }
fn default_store_path() -> PathBuf { PathBuf::from("campdash.db") }
fn default_timezone() -> String { "America/New_York".to_owned() }
fn default_min_sends() -> i64 { 50 }
fn default_live_days() -> u32 { 2 }
fn default_max_concurrent() -> usize { 10 }
fn default_retention_days() -> u32 { 30 }
fn default_cleanup_hour() -> u32 { 2 }

const TOKEN_FILE_NAME: &str = "leadpier_token.json";

impl ServerConfig {
  /// The configured zone.
  pub fn tz(&self) -> campdash_core::Result<Tz> {
    self
      .timezone
      .parse()
      .map_err(|_| campdash_core::Error::UnknownTimezone(self.timezone.clone()))
  }

  pub fn sync_settings(&self) -> campdash_core::Result<SyncSettings> {
    Ok(SyncSettings {
      timezone:              self.tz()?,
      min_sends:             self.min_sends,
      live_days:             self.live_days,
      revenue_cache_minutes: self.leadpier.cache_minutes,
      tenants:               self.tenants.clone(),
    })
  }

  pub fn auth(&self) -> AuthConfig { AuthConfig { users: self.users.clone() } }

  /// Revenue-platform settings with the token file defaulting to
  /// `leadpier_token.json` in the store's directory.
  pub fn leadpier(&self) -> LeadpierConfig {
    let mut leadpier = self.leadpier.clone();
    if leadpier.token_file.is_none() {
      leadpier.token_file = Some(self.store_path.with_file_name(TOKEN_FILE_NAME));
    }
    leadpier
  }
}
