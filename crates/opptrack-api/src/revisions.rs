//! Handlers for the per-record history endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/opportunities/:uid/revisions` | Revision-ledger rows |
//! | `GET`  | `/opportunities/:uid/forecast-revisions` | Forecast-change rows |
//!
//! Both return rows in protocol order and an empty list for an unknown
//! uid, mirroring "a deleted record has no history".

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use opptrack_core::{
  ledger::{ForecastChange, RevisionEntry},
  store::OpportunityStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /opportunities/:uid/revisions`
pub async fn list_revisions<S>(
  State(store): State<Arc<S>>,
  Path(uid): Path<Uuid>,
) -> Result<Json<Vec<RevisionEntry>>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let entries = store
    .list_revisions(uid)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(entries))
}

/// `GET /opportunities/:uid/forecast-revisions`
pub async fn list_forecast_changes<S>(
  State(store): State<Arc<S>>,
  Path(uid): Path<Uuid>,
) -> Result<Json<Vec<ForecastChange>>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let changes = store
    .list_forecast_changes(uid)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(changes))
}
