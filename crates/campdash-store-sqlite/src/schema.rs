//! SQL schema for the dashboard cache.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tenants (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT    NOT NULL UNIQUE,
    name        TEXT    NOT NULL,
    api_url     TEXT    NOT NULL,
    username    TEXT    NOT NULL,
    usertoken   TEXT    NOT NULL,
    le_domain   TEXT    NOT NULL DEFAULT '',
    phase       INTEGER NOT NULL DEFAULT 2,
    enabled     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at  TEXT    NOT NULL
);

-- One row per (tenant, statid); written only by the sync orchestrator.
CREATE TABLE IF NOT EXISTS campaigns (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id     INTEGER NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    campaign_id   TEXT    NOT NULL,
    statid        TEXT    NOT NULL,
    campaign_name TEXT    NOT NULL,
    date          TEXT    NOT NULL,   -- YYYY-MM-DD, local timezone
    time          TEXT    NOT NULL,   -- HH:MM:SS, local timezone
    is_seed       INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL,
    updated_at    TEXT    NOT NULL,
    UNIQUE (tenant_id, statid)
);

-- Exactly one per campaign, replaced wholesale on every sync.
CREATE TABLE IF NOT EXISTS campaign_stats (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id     INTEGER NOT NULL UNIQUE REFERENCES campaigns(id) ON DELETE CASCADE,
    sends           INTEGER NOT NULL DEFAULT 0,
    opens           INTEGER NOT NULL DEFAULT 0,
    open_percent    REAL    NOT NULL DEFAULT 0,
    clicks          INTEGER NOT NULL DEFAULT 0,
    click_percent   REAL    NOT NULL DEFAULT 0,
    bounces         INTEGER NOT NULL DEFAULT 0,
    bounce_percent  REAL    NOT NULL DEFAULT 0,
    unsubs          INTEGER NOT NULL DEFAULT 0,
    last_fetched_at TEXT    NOT NULL
);

-- Revenue per traffic source per day. Linked to campaigns by name only.
CREATE TABLE IF NOT EXISTS revenue_sources (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source_name   TEXT    NOT NULL,
    report_date   TEXT    NOT NULL,
    visitors      INTEGER NOT NULL DEFAULT 0,
    total_leads   INTEGER NOT NULL DEFAULT 0,
    sold_leads    INTEGER NOT NULL DEFAULT 0,
    total_revenue REAL    NOT NULL DEFAULT 0,
    epl           REAL    NOT NULL DEFAULT 0,
    epv           REAL    NOT NULL DEFAULT 0,
    fetched_at    TEXT    NOT NULL,
    UNIQUE (source_name, report_date)
);

CREATE INDEX IF NOT EXISTS campaigns_date_idx        ON campaigns(date);
CREATE INDEX IF NOT EXISTS revenue_sources_date_idx  ON revenue_sources(report_date);

PRAGMA user_version = 1;
";
