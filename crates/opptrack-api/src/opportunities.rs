//! Handlers for `/opportunities` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/opportunities` | All records |
//! | `POST`   | `/opportunities` | Body: flat field map, optional `changed_by` key; 201 |
//! | `GET`    | `/opportunities/:uid` | 404 if not found |
//! | `PUT`    | `/opportunities/:uid` | Partial update; 400 on unusable fields |
//! | `DELETE` | `/opportunities/:uid` | 204; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use opptrack_core::{
  opportunity::{NewOpportunity, Opportunity, UpdatePatch},
  store::OpportunityStore,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Lift the actor identity out of a raw payload map. It is request
/// metadata, not a business field, so it must not reach the sanitizer.
fn take_changed_by(body: &mut Map<String, Value>) -> Option<String> {
  match body.remove("changed_by") {
    Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
    _ => None,
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /opportunities`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Opportunity>>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = store
    .list_opportunities()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /opportunities` — body is a flat JSON field map.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(mut body): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let created_by = take_changed_by(&mut body);
  let input = NewOpportunity::from_raw(body)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let record = store
    .create_opportunity(input, created_by)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /opportunities/:uid`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(uid): Path<Uuid>,
) -> Result<Json<Opportunity>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = store
    .get_opportunity(uid)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("opportunity {uid} not found")))?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /opportunities/:uid` — partial update through the revision
/// protocol. Returns the updated record.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(uid): Path<Uuid>,
  Json(mut body): Json<Map<String, Value>>,
) -> Result<Json<Opportunity>, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let changed_by = take_changed_by(&mut body);
  let patch = UpdatePatch::from_raw(body)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let record = store
    .update_opportunity(uid, patch, changed_by)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("opportunity {uid} not found")))?;
  Ok(Json(record))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /opportunities/:uid`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(uid): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: OpportunityStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let deleted = store
    .delete_opportunity(uid)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("opportunity {uid} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
