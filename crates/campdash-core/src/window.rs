//! Date ranges and the live-window fetch policy.
//!
//! Campaign statistics keep changing for a few days after a send, so the
//! trailing `live_days + 1` days are always re-fetched. Anything older is
//! fetched once on a cold cache and then trusted forever.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{Error, Result};

// ─── DateRange ───────────────────────────────────────────────────────────────

/// An inclusive calendar-date range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
  start: NaiveDate,
  end:   NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidRange { start, end });
    }
    Ok(Self { start, end })
  }

  /// Parse two `YYYY-MM-DD` strings.
  pub fn parse(start: &str, end: &str) -> Result<Self> {
    Self::new(parse_date(start)?, parse_date(end)?)
  }

  pub fn single(day: NaiveDate) -> Self { Self { start: day, end: day } }

  pub fn start(&self) -> NaiveDate { self.start }

  pub fn end(&self) -> NaiveDate { self.end }

  pub fn contains(&self, day: NaiveDate) -> bool {
    self.start <= day && day <= self.end
  }

  /// Every date in the range, oldest first.
  pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
    let end = self.end;
    self.start.iter_days().take_while(move |d| *d <= end)
  }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

// ─── Live window ─────────────────────────────────────────────────────────────

/// The always-stale trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveWindow {
  pub live_days: u32,
}

impl LiveWindow {
  pub fn new(live_days: u32) -> Self { Self { live_days } }

  /// `today - (live_days + 1)`. Dates strictly after this are live.
  pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
    today
      .checked_sub_days(Days::new(u64::from(self.live_days) + 1))
      .unwrap_or(NaiveDate::MIN)
  }
}

/// Whether `day` falls inside the live window ending at `cutoff`.
pub fn is_live(day: NaiveDate, cutoff: NaiveDate) -> bool { day > cutoff }

/// The part of `range` that must always be re-fetched, if any.
pub fn live_part(range: DateRange, cutoff: NaiveDate) -> Option<DateRange> {
  (range.end > cutoff).then(|| DateRange {
    start: range.start.max(cutoff),
    end:   range.end,
  })
}

/// The part of `range` at or before `cutoff`, if any.
pub fn historical_part(range: DateRange, cutoff: NaiveDate) -> Option<DateRange> {
  (range.start <= cutoff).then(|| DateRange {
    start: range.start,
    end:   range.end.min(cutoff),
  })
}

// ─── Fetch plan ──────────────────────────────────────────────────────────────

/// What a sync of `requested` needs from the campaign source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
  pub requested: DateRange,
  pub cutoff:    NaiveDate,
  /// Sub-range that is always re-fetched.
  pub live:      Option<DateRange>,
  /// Historical sub-range with no cached rows at all.
  pub backfill:  Option<DateRange>,
}

impl FetchPlan {
  /// Decide what to fetch, given how many campaigns are already cached in
  /// the historical part of `requested`.
  ///
  /// Only the existence of cached rows is checked. A historical range that
  /// was partially written by an earlier run is never revisited.
  pub fn decide(
    requested: DateRange,
    cutoff: NaiveDate,
    cached_history: u64,
  ) -> Self {
    let live = live_part(requested, cutoff);
    let backfill =
      historical_part(requested, cutoff).filter(|_| cached_history == 0);
    Self { requested, cutoff, live, backfill }
  }

  /// `true` when nothing has to be fetched.
  pub fn is_noop(&self) -> bool { self.live.is_none() && self.backfill.is_none() }

  /// Earliest date the upstream fetch must reach back to.
  pub fn fetch_start(&self) -> Option<NaiveDate> {
    match (self.backfill, self.live) {
      (Some(_), _) => Some(self.requested.start),
      (None, Some(live)) => Some(live.start),
      (None, None) => None,
    }
  }
}

pub const MIN_LOOKBACK_DAYS: i64 = 3;
pub const MAX_LOOKBACK_DAYS: i64 = 30;

/// Trailing window, in days, that covers `fetch_start` through `today`.
pub fn lookback_days(fetch_start: NaiveDate, today: NaiveDate) -> u32 {
  let days = (today - fetch_start).num_days() + 1;
  days.clamp(MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS) as u32
}
