//! Tenants: one configured email-sending account each.
//!
//! The statically configured list ([`TenantConfig`]) is reconciled into the
//! store at boot; from then on the stored [`Tenant`] rows are the source of
//! truth and can be edited through the admin operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_phase() -> i64 { 2 }

fn default_enabled() -> bool { true }

/// A tenant as declared in configuration (or submitted by an admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
  pub code:      String,
  pub name:      String,
  pub api_url:   String,
  pub username:  String,
  pub usertoken: String,
  /// Identifier of this tenant on the revenue platform.
  pub le_domain: String,
  #[serde(default = "default_phase")]
  pub phase:     i64,
  #[serde(default = "default_enabled")]
  pub enabled:   bool,
}

/// A persisted tenant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
  pub id:         i64,
  pub code:       String,
  pub name:       String,
  pub api_url:    String,
  pub username:   String,
  /// Never echoed back over the API.
  #[serde(skip_serializing, default)]
  pub usertoken:  String,
  pub le_domain:  String,
  pub phase:      i64,
  pub enabled:    bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Partial update applied by [`crate::store::ReportStore::update_tenant`].
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantPatch {
  pub code:      Option<String>,
  pub name:      Option<String>,
  pub api_url:   Option<String>,
  pub username:  Option<String>,
  pub usertoken: Option<String>,
  pub le_domain: Option<String>,
  pub phase:     Option<i64>,
  pub enabled:   Option<bool>,
}

impl TenantPatch {
  pub fn apply(&self, tenant: &mut Tenant) {
    if let Some(v) = &self.code {
      tenant.code = v.clone();
    }
    if let Some(v) = &self.name {
      tenant.name = v.clone();
    }
    if let Some(v) = &self.api_url {
      tenant.api_url = v.clone();
    }
    if let Some(v) = &self.username {
      tenant.username = v.clone();
    }
    if let Some(v) = &self.usertoken {
      tenant.usertoken = v.clone();
    }
    if let Some(v) = &self.le_domain {
      tenant.le_domain = v.clone();
    }
    if let Some(v) = self.phase {
      tenant.phase = v;
    }
    if let Some(v) = self.enabled {
      tenant.enabled = v;
    }
  }
}

/// Parameters for [`crate::store::ReportStore::list_tenants_admin`].
#[derive(Debug, Clone)]
pub struct TenantQuery {
  /// Case-insensitive substring over name, code, `le_domain` and username.
  pub search:           Option<String>,
  /// 1-based; clamped into `[1, total_pages]` by the store.
  pub page:             u32,
  pub per_page:         u32,
  pub include_disabled: bool,
}

impl Default for TenantQuery {
  fn default() -> Self {
    Self {
      search:           None,
      page:             1,
      per_page:         15,
      include_disabled: true,
    }
  }
}

/// One page of tenants for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct TenantPage {
  pub tenants:     Vec<Tenant>,
  pub total:       u64,
  pub page:        u32,
  pub per_page:    u32,
  pub total_pages: u32,
}

impl TenantPage {
  /// Number of pages for `total` rows, never less than one.
  pub fn page_count(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    total.div_ceil(per_page).max(1) as u32
  }
}
