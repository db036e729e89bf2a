//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with a fixed microsecond precision so
//! that lexical order matches chronological order. Calendar dates are
//! `YYYY-MM-DD` and times of day `HH:MM:SS`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use campdash_core::{
  campaign::{Campaign, CampaignMetrics, CampaignRow},
  revenue::{SourceRow, StoredSource},
  tenant::Tenant,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const TENANT_COLUMNS: &str = "id, code, name, api_url, username, usertoken, \
                                  le_domain, phase, enabled, created_at, updated_at";

/// Raw values read directly from a `tenants` row, in [`TENANT_COLUMNS`] order.
pub struct RawTenant {
  pub id:         i64,
  pub code:       String,
  pub name:       String,
  pub api_url:    String,
  pub username:   String,
  pub usertoken:  String,
  pub le_domain:  String,
  pub phase:      i64,
  pub enabled:    bool,
  pub created_at: String,
  pub updated_at: String,
}

impl RawTenant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      code:       row.get(1)?,
      name:       row.get(2)?,
      api_url:    row.get(3)?,
      username:   row.get(4)?,
      usertoken:  row.get(5)?,
      le_domain:  row.get(6)?,
      phase:      row.get(7)?,
      enabled:    row.get(8)?,
      created_at: row.get(9)?,
      updated_at: row.get(10)?,
    })
  }

  pub fn into_tenant(self) -> Result<Tenant> {
    Ok(Tenant {
      id:         self.id,
      code:       self.code,
      name:       self.name,
      api_url:    self.api_url,
      username:   self.username,
      usertoken:  self.usertoken,
      le_domain:  self.le_domain,
      phase:      self.phase,
      enabled:    self.enabled,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `campaigns` row.
pub struct RawCampaign {
  pub id:            i64,
  pub tenant_id:     i64,
  pub campaign_id:   String,
  pub statid:        String,
  pub campaign_name: String,
  pub date:          String,
  pub time:          String,
  pub is_seed:       bool,
}

impl RawCampaign {
  pub fn into_campaign(self) -> Result<Campaign> {
    Ok(Campaign {
      id:            self.id,
      tenant_id:     self.tenant_id,
      campaign_id:   self.campaign_id,
      statid:        self.statid,
      campaign_name: self.campaign_name,
      date:          decode_date(&self.date)?,
      time:          decode_time(&self.time)?,
      is_seed:       self.is_seed,
    })
  }
}

/// Raw values of the tenant × campaign × stat join. Stat columns are
/// nullable because of the `LEFT JOIN`.
pub struct RawCampaignRow {
  // tenants
  pub tenant_code:     String,
  pub tenant_name:     String,
  pub le_domain:       String,
  // campaigns
  pub statid:          String,
  pub campaign_id:     String,
  pub campaign_name:   String,
  pub date:            String,
  pub time:            String,
  pub is_seed:         bool,
  // campaign_stats
  pub sends:           Option<i64>,
  pub opens:           Option<i64>,
  pub open_percent:    Option<f64>,
  pub clicks:          Option<i64>,
  pub click_percent:   Option<f64>,
  pub bounces:         Option<i64>,
  pub bounce_percent:  Option<f64>,
  pub unsubs:          Option<i64>,
  pub last_fetched_at: Option<String>,
}

impl RawCampaignRow {
  pub fn into_row(self) -> Result<CampaignRow> {
    Ok(CampaignRow {
      tenant_code:     self.tenant_code,
      tenant_name:     self.tenant_name,
      le_domain:       self.le_domain,
      statid:          self.statid,
      campaign_id:     self.campaign_id,
      campaign_name:   self.campaign_name,
      date:            decode_date(&self.date)?,
      time:            decode_time(&self.time)?,
      is_seed:         self.is_seed,
      metrics:         CampaignMetrics {
        sends:          self.sends.unwrap_or(0),
        opens:          self.opens.unwrap_or(0),
        open_percent:   self.open_percent.unwrap_or(0.0),
        clicks:         self.clicks.unwrap_or(0),
        click_percent:  self.click_percent.unwrap_or(0.0),
        bounces:        self.bounces.unwrap_or(0),
        bounce_percent: self.bounce_percent.unwrap_or(0.0),
        unsubs:         self.unsubs.unwrap_or(0),
      },
      last_fetched_at: self.last_fetched_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read from a `revenue_sources` row.
pub struct RawSource {
  pub source_name:   String,
  pub report_date:   String,
  pub visitors:      i64,
  pub total_leads:   i64,
  pub sold_leads:    i64,
  pub total_revenue: f64,
  pub epl:           f64,
  pub epv:           f64,
  pub fetched_at:    String,
}

impl RawSource {
  pub fn into_stored(self) -> Result<StoredSource> {
    Ok(StoredSource {
      row:         SourceRow {
        source:        self.source_name,
        visitors:      self.visitors,
        total_leads:   self.total_leads,
        sold_leads:    self.sold_leads,
        total_revenue: self.total_revenue,
        epl:           self.epl,
        epv:           self.epv,
      },
      report_date: decode_date(&self.report_date)?,
      fetched_at:  decode_dt(&self.fetched_at)?,
    })
  }
}
