//! Attribution of revenue-platform sources to campaign names.
//!
//! Source names are free-form tags set by whoever built the tracking link,
//! e.g. `mta-b_0216-cfl-e3` or `source3-0216-cfl-e3` for the campaign
//! `0216-cfl-e3`. A source is attributed to a campaign when its lowercased
//! name
//!
//! 1. equals the campaign name,
//! 2. ends with `_<name>`,
//! 3. is exactly `source<digits>-<name>` or `source<digits>_<name>`, or
//! 4. contains `-<name>` anywhere.
//!
//! Every matching source contributes; figures are summed.

use std::collections::HashMap;

use crate::{
  metrics::round2,
  revenue::{RevenueMatch, SourceRow},
};

/// `source<digits>[-_]<campaign>` with nothing before or after.
fn is_numbered_source_of(source: &str, campaign: &str) -> bool {
  let Some(rest) = source.strip_prefix("source") else {
    return false;
  };
  let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
  if digits == 0 {
    return false;
  }
  let rest = &rest[digits..];
  rest
    .strip_prefix(['-', '_'])
    .is_some_and(|tail| tail == campaign)
}

fn source_matches(source: &str, campaign: &str) -> bool {
  source == campaign
    || source.ends_with(&format!("_{campaign}"))
    || is_numbered_source_of(source, campaign)
    || source.contains(&format!("-{campaign}"))
}

/// Sum every source attributed to `campaign_name`.
///
/// Returns `None` when nothing matched, which is distinct from a match whose
/// revenue happens to be zero.
pub fn match_source_to_campaign(
  sources: &[SourceRow],
  campaign_name: &str,
) -> Option<RevenueMatch> {
  let campaign = campaign_name.to_lowercase();
  let mut total = RevenueMatch::default();
  let mut matched = false;

  for row in sources {
    let source = row.source.to_lowercase();
    if source.is_empty() || !source_matches(&source, &campaign) {
      continue;
    }
    matched = true;
    total.revenue += row.total_revenue;
    total.visitors += row.visitors;
    total.leads += row.total_leads;
    total.sold_leads += row.sold_leads;
  }

  matched.then(|| RevenueMatch {
    revenue: round2(total.revenue),
    ..total
  })
}

/// Run [`match_source_to_campaign`] for each name. Only names with at least
/// one matching source appear in the result.
pub fn match_all_campaigns<'a, I>(
  sources: &[SourceRow],
  campaign_names: I,
) -> HashMap<String, RevenueMatch>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut out = HashMap::new();
  for name in campaign_names {
    if out.contains_key(name) {
      continue;
    }
    if let Some(m) = match_source_to_campaign(sources, name) {
      out.insert(name.to_owned(), m);
    }
  }
  out
}
