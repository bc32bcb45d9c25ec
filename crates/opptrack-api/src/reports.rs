//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/forecast` | Optional `?status=<opp_status>`; `all` means no filter |
//! | `GET`  | `/reports/win-loss` | Records plus distinct filter values |
//!
//! Reports are recomputed from the full record set on every request; the
//! aggregation itself lives in `opptrack-reports`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::Utc;
use opptrack_core::{opportunity::Opportunity, store::OpportunityStore};
use opptrack_reports::{
  forecast::{self, ForecastReport},
  winloss,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Forecast ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
  /// Exact `opp_status` to restrict to; absent or `all` means no filter.
  pub status: Option<String>,
}

/// `GET /reports/forecast[?status=<opp_status>]`
pub async fn forecast<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ForecastParams>,
) -> Result<Json<ForecastReport>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = store
    .list_opportunities()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let status = params
    .status
    .filter(|s| !s.eq_ignore_ascii_case("all"));
  let filtered = records
    .iter()
    .filter(|opp| forecast::eligible(opp))
    .filter(|opp| {
      status.as_deref().is_none_or(|want| {
        opp.field("opp_status").and_then(|v| v.as_str()) == Some(want)
      })
    });

  let report = forecast::forecast_report(filtered, Utc::now().date_naive());
  Ok(Json(report))
}

// ─── Win/loss ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WinLossData {
  pub opportunities:       Vec<Opportunity>,
  pub unique_solutions:    Vec<String>,
  pub unique_account_mgrs: Vec<String>,
}

/// `GET /reports/win-loss`
pub async fn win_loss<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<WinLossData>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let opportunities = store
    .list_opportunities()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let unique_solutions = winloss::distinct_values(&opportunities, "solutions");
  let unique_account_mgrs =
    winloss::distinct_values(&opportunities, "account_mgr");

  Ok(Json(WinLossData {
    opportunities,
    unique_solutions,
    unique_account_mgrs,
  }))
}
