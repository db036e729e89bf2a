//! Clients for the two upstream platforms.
//!
//! - [`pinpointe`]: the email-sending platform, an XML-over-HTTP API queried
//!   in two phases per tenant (list sent campaigns, then one summary each).
//! - [`leadpier`]: the revenue platform, a JSON API behind a bearer token
//!   that is cached on disk between runs.
//!
//! The sync layer depends on the [`CampaignSource`] and [`RevenueFeed`]
//! traits rather than on the concrete clients.

pub mod error;
pub mod extract;
pub mod leadpier;
pub mod pinpointe;
pub mod token;

use std::future::Future;

use chrono::NaiveDate;
use campdash_core::{campaign::CampaignDetail, revenue::SourceRow, tenant::Tenant};

pub use error::{Result, UpstreamError};
pub use leadpier::{LeadpierClient, LeadpierConfig};
pub use pinpointe::PinpointeClient;

/// Trailing window for the campaign listing call, e.g. "7 days".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
  pub count: u32,
  pub unit:  &'static str,
}

impl Lookback {
  pub fn days(count: u32) -> Self { Self { count, unit: "days" } }
}

/// Where campaign statistics come from.
pub trait CampaignSource: Send + Sync {
  /// Every campaign `tenant` sent within `lookback`, with full statistics.
  ///
  /// Campaigns whose detail call fails are logged and left out; only a
  /// failure of the listing call itself is an error.
  fn full_campaign_stats<'a>(
    &'a self,
    tenant: &'a Tenant,
    lookback: Lookback,
  ) -> impl Future<Output = Result<Vec<CampaignDetail>>> + Send + 'a;
}

/// Where per-source revenue comes from.
pub trait RevenueFeed: Send + Sync {
  /// Source rows for the inclusive period `[from, to]`, highest revenue
  /// first.
  fn sources(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<SourceRow>>> + Send + '_;
}
