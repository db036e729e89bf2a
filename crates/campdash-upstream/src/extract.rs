//! Field-level extraction from campaign-platform XML responses.
//!
//! Responses are not always well-formed (tags nest inconsistently between
//! accounts and API versions), so nothing here parses a document. Each field
//! is located by a case-insensitive `<name>…</name>` pattern over the raw
//! text, and a missing or unparsable field falls back to a default instead of
//! failing the call.

use std::{
  collections::HashMap,
  sync::{LazyLock, Mutex},
};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::{Result, UpstreamError};

static STATUS_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<status>(.*?)</status>").expect("valid status regex"));

static ERROR_MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?is)<errormessage>(.*?)</errormessage>").expect("valid errormessage regex")
});

static ITEM_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?is)<item>(.*?)</item>").expect("valid item regex"));

/// Compiled `<name>…</name>` patterns, keyed by field name.
static FIELD_RES: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(Default::default);

fn compile_field(name: &str) -> Option<Regex> {
  Regex::new(&format!(r"(?is)<{0}>(.*?)</{0}>", regex::escape(name))).ok()
}

/// The pattern for `name`, compiled on first use.
fn field_regex(name: &str) -> Option<Regex> {
  let Ok(mut cache) = FIELD_RES.lock() else {
    return compile_field(name);
  };
  if let Some(re) = cache.get(name) {
    return Some(re.clone());
  }
  let re = compile_field(name)?;
  cache.insert(name.to_owned(), re.clone());
  Some(re)
}

/// Fail with the remote error message when `<status>` reads `FAILED`.
pub fn check_status(raw: &str, context: &str) -> Result<()> {
  let failed = STATUS_RE
    .captures(raw)
    .is_some_and(|c| c[1].trim().eq_ignore_ascii_case("FAILED"));
  if !failed {
    return Ok(());
  }

  let message = ERROR_MESSAGE_RE
    .captures(raw)
    .map(|c| c[1].trim().to_owned())
    .unwrap_or_else(|| "Unknown error".to_owned());
  Err(UpstreamError::Protocol {
    context: context.to_owned(),
    message,
  })
}

/// The inner text of every `<item>` block, in document order.
pub fn items(raw: &str) -> Vec<&str> {
  ITEM_RE
    .captures_iter(raw)
    .filter_map(|c| c.get(1).map(|m| m.as_str()))
    .collect()
}

/// Trimmed inner text of the first `<field>` element, if present.
pub fn field(xml: &str, name: &str) -> Option<String> {
  field_regex(name)?
    .captures(xml)
    .map(|c| c[1].trim().to_owned())
}

/// Like [`field`], with `default` for an absent element.
pub fn field_or(xml: &str, name: &str, default: &str) -> String {
  field(xml, name).unwrap_or_else(|| default.to_owned())
}

/// Integer field; absent, empty or non-numeric reads as `0`.
pub fn int_field(xml: &str, name: &str) -> i64 {
  field(xml, name)
    .and_then(|v| v.parse().ok())
    .unwrap_or(0)
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

const NAIVE_FORMATS: [&str; 4] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
];

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  // No offset: the platform reports UTC.
  for fmt in NAIVE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
      return Some(dt.and_utc());
    }
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
  raw.parse::<i64>().ok().and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Convert a send timestamp into a local date and time of day.
///
/// ISO-8601 is tried first, then Unix epoch seconds. Anything else resolves
/// to today's local date at midnight, with a warning unless the input was
/// empty.
pub fn parse_start_time(raw: &str, tz: Tz, now: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
  let raw = raw.trim();
  let parsed = if raw.is_empty() {
    None
  } else {
    parse_iso(raw).or_else(|| parse_epoch(raw))
  };

  match parsed {
    Some(utc) => {
      let local = utc.with_timezone(&tz);
      (local.date_naive(), local.time().with_nanosecond(0).unwrap_or(local.time()))
    }
    None => {
      if !raw.is_empty() {
        warn!(starttime = raw, "could not parse send time, using today");
      }
      (now.with_timezone(&tz).date_naive(), NaiveTime::MIN)
    }
  }
}
