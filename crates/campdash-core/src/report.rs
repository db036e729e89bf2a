//! Read-path view models: campaigns grouped per tenant with revenue merged in.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::{
  campaign::{CampaignMetrics, CampaignRow},
  metrics::{ecpm, epc, percent, round2},
  revenue::RevenueMatch,
};

/// One campaign as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignView {
  pub statid:          String,
  pub campaign_id:     String,
  pub campaign_name:   String,
  pub date:            NaiveDate,
  pub time:            NaiveTime,
  pub is_seed:         bool,
  #[serde(flatten)]
  pub metrics:         CampaignMetrics,
  pub last_fetched_at: Option<DateTime<Utc>>,
  pub revenue:         f64,
  /// Sold leads.
  pub conversions:     i64,
  pub visitors:        i64,
  pub total_leads:     i64,
  pub epc:             f64,
  pub ecpm:            f64,
}

/// Per-tenant sums. Rates are recomputed from the sums, not averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
  pub sends:          i64,
  pub opens:          i64,
  pub clicks:         i64,
  pub bounces:        i64,
  pub unsubs:         i64,
  pub revenue:        f64,
  pub conversions:    i64,
  pub visitors:       i64,
  pub total_leads:    i64,
  pub open_percent:   f64,
  pub click_percent:  f64,
  pub bounce_percent: f64,
  pub epc:            f64,
  pub ecpm:           f64,
}

impl Totals {
  fn add(&mut self, c: &CampaignView) {
    self.sends += c.metrics.sends;
    self.opens += c.metrics.opens;
    self.clicks += c.metrics.clicks;
    self.bounces += c.metrics.bounces;
    self.unsubs += c.metrics.unsubs;
    self.revenue += c.revenue;
    self.conversions += c.conversions;
    self.visitors += c.visitors;
    self.total_leads += c.total_leads;
  }

  fn finish(&mut self) {
    self.revenue = round2(self.revenue);
    self.open_percent = percent(self.opens, self.sends);
    self.click_percent = percent(self.clicks, self.sends);
    self.bounce_percent = percent(self.bounces, self.sends);
    self.epc = epc(self.revenue, self.clicks);
    self.ecpm = ecpm(self.revenue, self.sends);
  }
}

/// All campaigns of one tenant within the requested range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantReport {
  pub code:      String,
  pub name:      String,
  pub le_domain: String,
  pub campaigns: Vec<CampaignView>,
  pub totals:    Totals,
}

fn view(row: CampaignRow, revenue: Option<&RevenueMatch>) -> CampaignView {
  let rev = revenue.copied().unwrap_or_default();
  CampaignView {
    epc: epc(rev.revenue, row.metrics.clicks),
    ecpm: ecpm(rev.revenue, row.metrics.sends),
    statid: row.statid,
    campaign_id: row.campaign_id,
    campaign_name: row.campaign_name,
    date: row.date,
    time: row.time,
    is_seed: row.is_seed,
    metrics: row.metrics,
    last_fetched_at: row.last_fetched_at,
    revenue: rev.revenue,
    conversions: rev.sold_leads,
    visitors: rev.visitors,
    total_leads: rev.leads,
  }
}

/// Group flat rows by tenant code, keeping the order in which tenants first
/// appear, and attach revenue by exact campaign name.
pub fn group_campaigns(
  rows: Vec<CampaignRow>,
  revenue: &HashMap<String, RevenueMatch>,
) -> Vec<TenantReport> {
  let mut reports: Vec<TenantReport> = Vec::new();
  let mut index: HashMap<String, usize> = HashMap::new();

  for row in rows {
    let slot = *index.entry(row.tenant_code.clone()).or_insert_with(|| {
      reports.push(TenantReport {
        code:      row.tenant_code.clone(),
        name:      row.tenant_name.clone(),
        le_domain: row.le_domain.clone(),
        campaigns: Vec::new(),
        totals:    Totals::default(),
      });
      reports.len() - 1
    });

    let matched = revenue.get(&row.campaign_name);
    let campaign = view(row, matched);
    let report = &mut reports[slot];
    report.totals.add(&campaign);
    report.campaigns.push(campaign);
  }

  for report in &mut reports {
    report.totals.finish();
  }
  reports
}
