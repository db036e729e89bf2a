//! Derived-metric helpers shared by the upstream parser and the read path.
//!
//! Every ratio here is zero-guarded: a zero divisor yields `0.0`, never a
//! NaN or infinity.

/// Round to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 { (value * 100.0).round_ties_even() / 100.0 }

/// `count / sends * 100`, rounded to two decimals.
pub fn percent(count: i64, sends: i64) -> f64 {
  if sends <= 0 {
    return 0.0;
  }
  round2(count as f64 / sends as f64 * 100.0)
}

/// Earnings per click.
pub fn epc(revenue: f64, clicks: i64) -> f64 {
  if clicks <= 0 || revenue <= 0.0 {
    return 0.0;
  }
  round2(revenue / clicks as f64)
}

/// Earnings per thousand sends.
pub fn ecpm(revenue: f64, sends: i64) -> f64 {
  if sends <= 0 || revenue <= 0.0 {
    return 0.0;
  }
  round2(revenue / sends as f64 * 1000.0)
}
