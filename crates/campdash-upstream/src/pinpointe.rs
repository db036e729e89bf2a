//! Client for the email-sending platform's XML API.
//!
//! Each tenant is queried in two phases:
//!
//! 1. `Newsletters/GetNewslettersSent` lists campaigns sent within a trailing
//!    window.
//! 2. `Newsletters/GetNewsletterSummary` fetches the delivery statistics of
//!    one send, by stat-id. These calls run concurrently, at most
//!    `max_concurrent` at a time, over one shared connection pool.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use quick_xml::escape::escape;
use reqwest::{Client, header::CONTENT_TYPE};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use campdash_core::{
  campaign::{CampaignDetail, CampaignMetrics},
  tenant::Tenant,
};

use crate::{
  CampaignSource, Lookback, Result, UpstreamError,
  extract::{check_status, field_or, int_field, items, parse_start_time},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

// ─── Wire results ────────────────────────────────────────────────────────────

/// One entry of the phase-1 listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCampaign {
  pub newsletter_id: String,
  pub name:          String,
  pub subject:       String,
  pub statid:        String,
  pub start_time:    String,
  pub finish_time:   String,
  pub sent_to:       i64,
}

/// The phase-2 summary of one send.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSummary {
  pub statid:          String,
  /// Empty when the platform did not report a name.
  pub newsletter_name: String,
  pub metrics:         CampaignMetrics,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the campaign platform.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PinpointeClient {
  client:         Client,
  tz:             Tz,
  max_concurrent: usize,
}

impl PinpointeClient {
  /// `tz` is the zone send times are reported in; `max_concurrent` caps the
  /// in-flight summary calls per tenant.
  pub fn new(tz: Tz, max_concurrent: usize) -> Result<Self> {
    Self::with_timeout(tz, max_concurrent, DEFAULT_TIMEOUT)
  }

  pub fn with_timeout(tz: Tz, max_concurrent: usize, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      tz,
      max_concurrent: max_concurrent.max(1),
    })
  }

  fn request_body(
    tenant: &Tenant,
    method: &str,
    details: &[(&str, String)],
  ) -> String {
    let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><xmlrequest>");
    body.push_str(&format!("<username>{}</username>", escape(tenant.username.as_str())));
    body.push_str(&format!("<usertoken>{}</usertoken>", escape(tenant.usertoken.as_str())));
    body.push_str("<requesttype>Newsletters</requesttype>");
    body.push_str(&format!("<requestmethod>{method}</requestmethod>"));
    body.push_str("<details>");
    for (key, value) in details {
      body.push_str(&format!("<{key}>{}</{key}>", escape(value.as_str())));
    }
    body.push_str("</details></xmlrequest>");
    body
  }

  async fn post(&self, url: &str, body: String) -> Result<String> {
    debug!(url, bytes = body.len(), "POST");
    let resp = self
      .client
      .post(url)
      .header(CONTENT_TYPE, "application/xml")
      .body(body)
      .send()
      .await?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
      warn!(url, %status, "campaign platform returned an error status");
      return Err(UpstreamError::HttpStatus {
        status,
        url: url.to_owned(),
      });
    }

    let text = resp.text().await?;
    debug!(url, chars = text.len(), "response received");
    Ok(text)
  }

  /// Phase 1: campaigns sent within `lookback`.
  pub async fn campaigns_sent(
    &self,
    tenant: &Tenant,
    lookback: Lookback,
  ) -> Result<Vec<SentCampaign>> {
    info!(
      tenant = %tenant.name,
      count = lookback.count,
      unit = lookback.unit,
      "listing sent campaigns"
    );
    let body = Self::request_body(
      tenant,
      "GetNewslettersSent",
      &[
        ("intervalcount", lookback.count.to_string()),
        ("intervalunits", lookback.unit.to_owned()),
      ],
    );

    let raw = self.post(&tenant.api_url, body).await?;
    check_status(&raw, &format!("GetNewslettersSent/{}", tenant.name))?;

    let campaigns: Vec<SentCampaign> = items(&raw)
      .into_iter()
      .map(|item| SentCampaign {
        newsletter_id: field_or(item, "newsletterid", ""),
        name:          field_or(item, "name", "Unnamed"),
        subject:       field_or(item, "subject", ""),
        statid:        field_or(item, "statid", ""),
        start_time:    field_or(item, "starttime", ""),
        finish_time:   field_or(item, "finishtime", ""),
        sent_to:       int_field(item, "sentto"),
      })
      .collect();

    info!(tenant = %tenant.name, count = campaigns.len(), "found sent campaigns");
    Ok(campaigns)
  }

  /// Phase 2: delivery statistics of one send.
  pub async fn campaign_summary(
    &self,
    tenant: &Tenant,
    statid: &str,
  ) -> Result<CampaignSummary> {
    let body = Self::request_body(
      tenant,
      "GetNewsletterSummary",
      &[
        ("statid", statid.to_owned()),
        ("summaryonly", "1".to_owned()),
        ("resultlimit", "0".to_owned()),
      ],
    );

    let raw = self.post(&tenant.api_url, body).await?;
    check_status(
      &raw,
      &format!("GetNewsletterSummary/{}/{statid}", tenant.name),
    )?;

    let sends = int_field(&raw, "sendsize");
    let unique_opens = int_field(&raw, "emailopens_unique");
    let opens = if unique_opens > 0 {
      unique_opens
    } else {
      int_field(&raw, "emailopens")
    };
    let bounces = int_field(&raw, "bouncecount_soft")
      + int_field(&raw, "bouncecount_hard")
      + int_field(&raw, "bouncecount_unknown");

    Ok(CampaignSummary {
      statid:          statid.to_owned(),
      newsletter_name: field_or(&raw, "newslettername", ""),
      metrics:         CampaignMetrics::from_counts(
        sends,
        opens,
        int_field(&raw, "linkclicks"),
        bounces,
        int_field(&raw, "unsubscribecount"),
      ),
    })
  }

  fn detail(
    &self,
    sent: &SentCampaign,
    summary: CampaignSummary,
    now: DateTime<Utc>,
  ) -> CampaignDetail {
    let (date, time) = parse_start_time(&sent.start_time, self.tz, now);
    let campaign_name = if summary.newsletter_name.is_empty() {
      sent.name.clone()
    } else {
      summary.newsletter_name
    };
    CampaignDetail {
      campaign_id: sent.newsletter_id.clone(),
      statid: sent.statid.clone(),
      campaign_name,
      date,
      time,
      metrics: summary.metrics,
    }
  }
}

impl CampaignSource for PinpointeClient {
  async fn full_campaign_stats(
    &self,
    tenant: &Tenant,
    lookback: Lookback,
  ) -> Result<Vec<CampaignDetail>> {
    let started = std::time::Instant::now();
    let sent = self.campaigns_sent(tenant, lookback).await?;
    let with_stats: Vec<SentCampaign> =
      sent.into_iter().filter(|c| !c.statid.is_empty()).collect();

    info!(
      tenant = %tenant.name,
      campaigns = with_stats.len(),
      concurrency = self.max_concurrent,
      "fetching campaign summaries"
    );

    let gate = Arc::new(Semaphore::new(self.max_concurrent));
    let now = Utc::now();
    let fetches = with_stats.into_iter().map(|sent| {
      let gate = Arc::clone(&gate);
      async move {
        let Ok(_permit) = gate.acquire().await else {
          return None;
        };
        match self.campaign_summary(tenant, &sent.statid).await {
          Ok(summary) => Some(self.detail(&sent, summary, now)),
          Err(e) => {
            warn!(
              tenant = %tenant.name,
              statid = %sent.statid,
              error = %e,
              "summary failed, skipping campaign"
            );
            None
          }
        }
      }
    });

    let details: Vec<CampaignDetail> = join_all(fetches).await.into_iter().flatten().collect();

    info!(
      tenant = %tenant.name,
      campaigns = details.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "campaign stats fetched"
    );
    Ok(details)
  }
}
