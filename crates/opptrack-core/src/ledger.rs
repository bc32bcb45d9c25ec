//! Ledger entry types: the revision history and the forecast-change log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One row of the revision ledger, identified by
/// `(opportunity_uid, revision_number)`.
///
/// `snapshot` is a point-in-time projection of the audit columns as they
/// stood at that revision, not a diff. Rows for past revisions are sealed:
/// once the record advances beyond `revision_number`, this row never
/// changes again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionEntry {
  pub opportunity_uid: Uuid,
  pub revision_number: i64,
  pub changed_by:      Option<String>,
  pub changed_at:      DateTime<Utc>,
  pub snapshot:        Map<String, Value>,
}

/// One row of the append-only forecast-change log. Written whenever
/// `forecast_date` moves to a non-empty new value; never updated or
/// deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastChange {
  pub id:                i64,
  pub opportunity_uid:   Uuid,
  pub old_forecast_date: Option<String>,
  pub new_forecast_date: String,
  pub changed_by:        Option<String>,
  pub changed_at:        DateTime<Utc>,
  pub comment:           Option<String>,
}
