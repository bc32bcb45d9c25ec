//! Forecast roll-ups: totals, next-calendar-month outlook, per-month
//! buckets, and per-project detail rows.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use opptrack_core::opportunity::Opportunity;
use serde::Serialize;

use crate::{currency, dates};

// ─── Report types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
  pub total_count:       usize,
  pub total_amount:      f64,
  pub next_month_count:  usize,
  pub next_month_amount: f64,
  pub monthly:           Vec<MonthlySummary>,
  pub projects:          Vec<ProjectForecast>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
  /// Display label, e.g. "Mar 2025".
  pub month:        String,
  pub count:        usize,
  pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectForecast {
  pub name:           String,
  pub amount:         f64,
  pub forecast_month: String,
  pub forecast_week:  u32,
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

const EXCLUDED_DECISIONS: &[&str] = &["DECLINE", "DECLINED"];
const EXCLUDED_STATUSES: &[&str] = &["LOST", "OP100"];

/// Whether a record belongs in the forecast at all: declined and closed
/// opportunities are out regardless of their forecast date.
pub fn eligible(opp: &Opportunity) -> bool {
  let decision = opp.field("decision").and_then(|v| v.as_str());
  let status = opp.field("opp_status").and_then(|v| v.as_str());

  !decision.is_some_and(|d| EXCLUDED_DECISIONS.contains(&d))
    && !status.is_some_and(|s| EXCLUDED_STATUSES.contains(&s))
}

// ─── Bucketing ───────────────────────────────────────────────────────────────

/// 1-based week of the month, with weeks starting on Sunday: the week a
/// day falls in depends on which weekday the month opened on.
pub fn week_of_month(date: NaiveDate) -> u32 {
  let first = date.with_day(1).unwrap_or(date);
  let offset = first.weekday().num_days_from_sunday();
  (date.day() + offset).div_ceil(7)
}

fn month_label(date: NaiveDate) -> String {
  date.format("%b %Y").to_string()
}

fn next_month(today: NaiveDate) -> (i32, u32) {
  if today.month() == 12 {
    (today.year() + 1, 1)
  } else {
    (today.year(), today.month() + 1)
  }
}

// ─── Report assembly ─────────────────────────────────────────────────────────

/// Build the forecast report over `records`. Records without a parseable
/// forecast date are skipped; callers apply [`eligible`] and any status
/// filter beforehand.
pub fn forecast_report<'a>(
  records: impl IntoIterator<Item = &'a Opportunity>,
  today: NaiveDate,
) -> ForecastReport {
  let (next_year, next_mon) = next_month(today);

  let mut total_count = 0;
  let mut total_amount = 0.0;
  let mut next_month_count = 0;
  let mut next_month_amount = 0.0;
  // Keyed "YYYY-MM" so iteration is chronological.
  let mut monthly: BTreeMap<String, MonthlySummary> = BTreeMap::new();
  let mut projects = Vec::new();

  for opp in records {
    let Some(date) = opp
      .field("forecast_date")
      .and_then(dates::parse_date_value)
    else {
      continue;
    };

    let amount = opp
      .field("final_amt")
      .map_or(0.0, currency::parse_amount);
    let name = opp
      .field("project_name")
      .and_then(|v| v.as_str())
      .unwrap_or("Unknown Project")
      .to_owned();
    let label = month_label(date);

    total_count += 1;
    total_amount += amount;

    let key = format!("{:04}-{:02}", date.year(), date.month());
    let bucket = monthly.entry(key).or_insert_with(|| MonthlySummary {
      month:        label.clone(),
      count:        0,
      total_amount: 0.0,
    });
    bucket.count += 1;
    bucket.total_amount += amount;

    if date.year() == next_year && date.month() == next_mon {
      next_month_count += 1;
      next_month_amount += amount;
    }

    projects.push(ProjectForecast {
      name,
      amount,
      forecast_month: label,
      forecast_week: week_of_month(date),
    });
  }

  ForecastReport {
    total_count,
    total_amount,
    next_month_count,
    next_month_amount,
    monthly: monthly.into_values().collect(),
    projects,
  }
}
