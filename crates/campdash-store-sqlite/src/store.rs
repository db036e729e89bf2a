//! [`SqliteStore`]: the SQLite implementation of [`ReportStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use campdash_core::{
  campaign::{Campaign, CampaignMetrics, CampaignRow, NewCampaign, SeedFilter},
  revenue::{SourceRow, StoredSource},
  store::{CleanupCounts, ReportStore},
  tenant::{Tenant, TenantConfig, TenantPage, TenantPatch, TenantQuery},
  window::DateRange,
};

use crate::{
  Error, Result,
  encode::{
    RawCampaign, RawCampaignRow, RawSource, RawTenant, TENANT_COLUMNS, decode_dt,
    encode_date, encode_dt, encode_time,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The dashboard cache backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted and
/// every call is serialised onto one database thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// Plain functions over a borrowed connection so they can run either on their
// own or inside a caller's transaction.

fn write_campaign(
  conn: &rusqlite::Connection,
  tenant_id: i64,
  c: &NewCampaign,
  now: &str,
) -> rusqlite::Result<i64> {
  conn.query_row(
    "INSERT INTO campaigns (
       tenant_id, campaign_id, statid, campaign_name, date, time, is_seed,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
     ON CONFLICT (tenant_id, statid) DO UPDATE SET
       campaign_id   = excluded.campaign_id,
       campaign_name = excluded.campaign_name,
       date          = excluded.date,
       time          = excluded.time,
       is_seed       = excluded.is_seed,
       updated_at    = excluded.updated_at
     RETURNING id",
    rusqlite::params![
      tenant_id,
      c.campaign_id,
      c.statid,
      c.campaign_name,
      encode_date(c.date),
      encode_time(c.time),
      c.is_seed,
      now,
    ],
    |row| row.get(0),
  )
}

fn write_stat(
  conn: &rusqlite::Connection,
  campaign_id: i64,
  m: &CampaignMetrics,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO campaign_stats (
       campaign_id, sends, opens, open_percent, clicks, click_percent,
       bounces, bounce_percent, unsubs, last_fetched_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT (campaign_id) DO UPDATE SET
       sends           = excluded.sends,
       opens           = excluded.opens,
       open_percent    = excluded.open_percent,
       clicks          = excluded.clicks,
       click_percent   = excluded.click_percent,
       bounces         = excluded.bounces,
       bounce_percent  = excluded.bounce_percent,
       unsubs          = excluded.unsubs,
       last_fetched_at = excluded.last_fetched_at",
    rusqlite::params![
      campaign_id,
      m.sends,
      m.opens,
      m.open_percent,
      m.clicks,
      m.click_percent,
      m.bounces,
      m.bounce_percent,
      m.unsubs,
      now,
    ],
  )?;
  Ok(())
}

fn seed_clause(seeds: SeedFilter) -> &'static str {
  match seeds {
    SeedFilter::Exclude => "AND c.is_seed = 0",
    SeedFilter::Only => "AND c.is_seed = 1",
    SeedFilter::All => "",
  }
}

const TENANT_SEARCH_FILTER: &str = "WHERE (?1 OR enabled = 1)
   AND (?2 IS NULL
        OR name      LIKE ?2
        OR code      LIKE ?2
        OR le_domain LIKE ?2
        OR username  LIKE ?2)";

// ─── ReportStore impl ────────────────────────────────────────────────────────

impl ReportStore for SqliteStore {
  type Error = Error;

  // ── Tenants ───────────────────────────────────────────────────────────────

  async fn get_tenant(&self, code: &str) -> Result<Option<Tenant>> {
    let code = code.to_owned();

    let raw: Option<RawTenant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE code = ?1"),
              rusqlite::params![code],
              RawTenant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTenant::into_tenant).transpose()
  }

  async fn get_tenant_by_id(&self, id: i64) -> Result<Option<Tenant>> {
    let raw: Option<RawTenant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
              rusqlite::params![id],
              RawTenant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTenant::into_tenant).transpose()
  }

  async fn list_tenants(&self, enabled_only: bool) -> Result<Vec<Tenant>> {
    let raws: Vec<RawTenant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TENANT_COLUMNS} FROM tenants
           WHERE (?1 = 0 OR enabled = 1)
           ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![enabled_only], RawTenant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTenant::into_tenant).collect()
  }

  async fn list_tenants_admin(&self, query: &TenantQuery) -> Result<TenantPage> {
    let search = query
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(|s| format!("%{s}%"));
    let include_disabled = query.include_disabled;
    let per_page = query.per_page.max(1);
    let requested = query.page;

    let (total, page, raws): (u64, u32, Vec<RawTenant>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM tenants {TENANT_SEARCH_FILTER}"),
          rusqlite::params![include_disabled, search],
          |r| r.get(0),
        )?;
        let total = total.max(0) as u64;
        let page = requested.clamp(1, TenantPage::page_count(total, per_page));
        let offset = i64::from(page - 1) * i64::from(per_page);

        let mut stmt = conn.prepare(&format!(
          "SELECT {TENANT_COLUMNS} FROM tenants {TENANT_SEARCH_FILTER}
           ORDER BY name
           LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![include_disabled, search, i64::from(per_page), offset],
            RawTenant::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, page, rows))
      })
      .await?;

    let tenants = raws
      .into_iter()
      .map(RawTenant::into_tenant)
      .collect::<Result<Vec<_>>>()?;

    Ok(TenantPage {
      tenants,
      total,
      page,
      per_page,
      total_pages: TenantPage::page_count(total, per_page),
    })
  }

  async fn upsert_tenant(&self, config: &TenantConfig) -> Result<Tenant> {
    let cfg = config.clone();
    let now = encode_dt(Utc::now());

    let raw: RawTenant = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO tenants (
               code, name, api_url, username, usertoken, le_domain, phase, enabled,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             ON CONFLICT (code) DO UPDATE SET
               name       = excluded.name,
               api_url    = excluded.api_url,
               username   = excluded.username,
               usertoken  = excluded.usertoken,
               le_domain  = excluded.le_domain,
               phase      = excluded.phase,
               enabled    = excluded.enabled,
               updated_at = excluded.updated_at
             RETURNING {TENANT_COLUMNS}"
          ),
          rusqlite::params![
            cfg.code,
            cfg.name,
            cfg.api_url,
            cfg.username,
            cfg.usertoken,
            cfg.le_domain,
            cfg.phase,
            cfg.enabled,
            now,
          ],
          RawTenant::from_row,
        )?)
      })
      .await?;

    raw.into_tenant()
  }

  async fn create_tenant(&self, config: &TenantConfig) -> Result<Tenant> {
    let cfg = config.clone();
    let code = config.code.clone();
    let now = encode_dt(Utc::now());

    let raw: Option<RawTenant> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM tenants WHERE code = ?1",
            rusqlite::params![cfg.code],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(None);
        }

        let raw = tx.query_row(
          &format!(
            "INSERT INTO tenants (
               code, name, api_url, username, usertoken, le_domain, phase, enabled,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {TENANT_COLUMNS}"
          ),
          rusqlite::params![
            cfg.code,
            cfg.name,
            cfg.api_url,
            cfg.username,
            cfg.usertoken,
            cfg.le_domain,
            cfg.phase,
            cfg.enabled,
            now,
          ],
          RawTenant::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    let tenant = raw.ok_or(Error::DuplicateTenant(code))?.into_tenant()?;
    info!(code = %tenant.code, name = %tenant.name, "created tenant");
    Ok(tenant)
  }

  async fn update_tenant(&self, id: i64, patch: &TenantPatch) -> Result<Option<Tenant>> {
    let Some(mut tenant) = self.get_tenant_by_id(id).await? else {
      return Ok(None);
    };

    if let Some(code) = &patch.code
      && *code != tenant.code
      && self.get_tenant(code).await?.is_some()
    {
      return Err(Error::DuplicateTenant(code.clone()));
    }

    patch.apply(&mut tenant);
    let now = encode_dt(Utc::now());
    let t = tenant.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE tenants SET
             code = ?2, name = ?3, api_url = ?4, username = ?5, usertoken = ?6,
             le_domain = ?7, phase = ?8, enabled = ?9, updated_at = ?10
           WHERE id = ?1",
          rusqlite::params![
            t.id,
            t.code,
            t.name,
            t.api_url,
            t.username,
            t.usertoken,
            t.le_domain,
            t.phase,
            t.enabled,
            now,
          ],
        )?;
        Ok(())
      })
      .await?;

    info!(id, code = %tenant.code, "updated tenant");
    self.get_tenant_by_id(id).await
  }

  async fn delete_tenant(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM tenants WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    if deleted > 0 {
      info!(id, "deleted tenant and its campaigns");
    }
    Ok(deleted > 0)
  }

  // ── Campaigns ─────────────────────────────────────────────────────────────

  async fn upsert_campaign(&self, tenant_id: i64, campaign: &NewCampaign) -> Result<i64> {
    let c = campaign.clone();
    let now = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| Ok(write_campaign(conn, tenant_id, &c, &now)?))
      .await?;
    Ok(id)
  }

  async fn upsert_campaign_stat(
    &self,
    campaign_id: i64,
    metrics: &CampaignMetrics,
  ) -> Result<()> {
    let m = *metrics;
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| Ok(write_stat(conn, campaign_id, &m, &now)?))
      .await?;
    Ok(())
  }

  async fn record_campaign(
    &self,
    tenant_id: i64,
    campaign: &NewCampaign,
    metrics: &CampaignMetrics,
  ) -> Result<i64> {
    let c = campaign.clone();
    let m = *metrics;
    let now = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let id = write_campaign(&tx, tenant_id, &c, &now)?;
        write_stat(&tx, id, &m, &now)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }

  async fn get_campaign_by_statid(
    &self,
    tenant_id: i64,
    statid: &str,
  ) -> Result<Option<Campaign>> {
    let statid = statid.to_owned();

    let raw: Option<RawCampaign> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, tenant_id, campaign_id, statid, campaign_name, date, time, is_seed
               FROM campaigns WHERE tenant_id = ?1 AND statid = ?2",
              rusqlite::params![tenant_id, statid],
              |row| {
                Ok(RawCampaign {
                  id:            row.get(0)?,
                  tenant_id:     row.get(1)?,
                  campaign_id:   row.get(2)?,
                  statid:        row.get(3)?,
                  campaign_name: row.get(4)?,
                  date:          row.get(5)?,
                  time:          row.get(6)?,
                  is_seed:       row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCampaign::into_campaign).transpose()
  }

  async fn count_campaigns_in_range(&self, range: DateRange) -> Result<u64> {
    let start = encode_date(range.start());
    let end = encode_date(range.end());

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM campaigns WHERE date BETWEEN ?1 AND ?2",
          rusqlite::params![start, end],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count.max(0) as u64)
  }

  async fn query_campaigns_in_range(
    &self,
    range: DateRange,
    seeds: SeedFilter,
  ) -> Result<Vec<CampaignRow>> {
    let start = encode_date(range.start());
    let end = encode_date(range.end());
    let sql = format!(
      "SELECT
         t.code, t.name, t.le_domain,
         c.statid, c.campaign_id, c.campaign_name, c.date, c.time, c.is_seed,
         s.sends, s.opens, s.open_percent, s.clicks, s.click_percent,
         s.bounces, s.bounce_percent, s.unsubs, s.last_fetched_at
       FROM campaigns c
       JOIN tenants t             ON t.id = c.tenant_id
       LEFT JOIN campaign_stats s ON s.campaign_id = c.id
       WHERE t.enabled = 1
         AND c.date BETWEEN ?1 AND ?2
         {}
       ORDER BY t.name, c.date DESC, c.time DESC",
      seed_clause(seeds)
    );

    let raws: Vec<RawCampaignRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![start, end], |row| {
            Ok(RawCampaignRow {
              tenant_code:     row.get(0)?,
              tenant_name:     row.get(1)?,
              le_domain:       row.get(2)?,
              statid:          row.get(3)?,
              campaign_id:     row.get(4)?,
              campaign_name:   row.get(5)?,
              date:            row.get(6)?,
              time:            row.get(7)?,
              is_seed:         row.get(8)?,
              sends:           row.get(9)?,
              opens:           row.get(10)?,
              open_percent:    row.get(11)?,
              clicks:          row.get(12)?,
              click_percent:   row.get(13)?,
              bounces:         row.get(14)?,
              bounce_percent:  row.get(15)?,
              unsubs:          row.get(16)?,
              last_fetched_at: row.get(17)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCampaignRow::into_row).collect()
  }

  // ── Revenue ───────────────────────────────────────────────────────────────

  async fn upsert_revenue_sources(&self, date: NaiveDate, rows: &[SourceRow]) -> Result<u64> {
    let rows = rows.to_vec();
    let day = encode_date(date);
    let now = encode_dt(Utc::now());

    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut count = 0_u64;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO revenue_sources (
               source_name, report_date, visitors, total_leads, sold_leads,
               total_revenue, epl, epv, fetched_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (source_name, report_date) DO UPDATE SET
               visitors      = excluded.visitors,
               total_leads   = excluded.total_leads,
               sold_leads    = excluded.sold_leads,
               total_revenue = excluded.total_revenue,
               epl           = excluded.epl,
               epv           = excluded.epv,
               fetched_at    = excluded.fetched_at",
          )?;
          for row in rows.iter().filter(|r| !r.source.is_empty()) {
            stmt.execute(rusqlite::params![
              row.source,
              day,
              row.visitors,
              row.total_leads,
              row.sold_leads,
              row.total_revenue,
              row.epl,
              row.epv,
              now,
            ])?;
            count += 1;
          }
        }
        tx.commit()?;
        Ok(count)
      })
      .await?;

    info!(%date, count, "upserted revenue sources");
    Ok(count)
  }

  async fn query_revenue_sources_by_date(&self, date: NaiveDate) -> Result<Vec<StoredSource>> {
    let day = encode_date(date);

    let raws: Vec<RawSource> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT source_name, report_date, visitors, total_leads, sold_leads,
                  total_revenue, epl, epv, fetched_at
           FROM revenue_sources
           WHERE report_date = ?1
           ORDER BY total_revenue DESC, source_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![day], |row| {
            Ok(RawSource {
              source_name:   row.get(0)?,
              report_date:   row.get(1)?,
              visitors:      row.get(2)?,
              total_leads:   row.get(3)?,
              sold_leads:    row.get(4)?,
              total_revenue: row.get(5)?,
              epl:           row.get(6)?,
              epv:           row.get(7)?,
              fetched_at:    row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(%date, count = raws.len(), "loaded cached revenue sources");
    raws.into_iter().map(RawSource::into_stored).collect()
  }

  async fn last_revenue_sync(&self, date: NaiveDate) -> Result<Option<DateTime<Utc>>> {
    let day = encode_date(date);

    let latest: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT MAX(fetched_at) FROM revenue_sources WHERE report_date = ?1",
          rusqlite::params![day],
          |r| r.get(0),
        )?)
      })
      .await?;

    latest.as_deref().map(decode_dt).transpose()
  }

  // ── Retention ─────────────────────────────────────────────────────────────

  async fn delete_older_than(&self, cutoff: NaiveDate) -> Result<CleanupCounts> {
    let day = encode_date(cutoff);

    let (campaigns, campaign_stats, revenue_sources) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let stats: i64 = tx.query_row(
          "SELECT COUNT(*) FROM campaign_stats s
           JOIN campaigns c ON c.id = s.campaign_id
           WHERE c.date < ?1",
          rusqlite::params![day],
          |r| r.get(0),
        )?;
        // Stats go with their campaigns via ON DELETE CASCADE.
        let campaigns =
          tx.execute("DELETE FROM campaigns WHERE date < ?1", rusqlite::params![day])?;
        let sources = tx.execute(
          "DELETE FROM revenue_sources WHERE report_date < ?1",
          rusqlite::params![day],
        )?;
        tx.commit()?;
        Ok((campaigns as u64, stats.max(0) as u64, sources as u64))
      })
      .await?;

    info!(
      %cutoff,
      campaigns,
      campaign_stats,
      revenue_sources,
      "removed rows older than cutoff"
    );
    Ok(CleanupCounts {
      campaigns,
      campaign_stats,
      revenue_sources,
      cutoff_date: cutoff,
    })
  }
}
