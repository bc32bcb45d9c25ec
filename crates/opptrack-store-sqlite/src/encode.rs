//! Encoding and decoding helpers between Rust domain types and the values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Business-field values map between `serde_json::Value`
//! and SQLite storage classes so a caller-supplied number stays a number
//! and a string stays a string.

use chrono::{DateTime, Utc};
use opptrack_core::{
  fields,
  ledger::{ForecastChange, RevisionEntry},
  opportunity::Opportunity,
};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Field values ────────────────────────────────────────────────────────────

/// Convert a JSON field value into the SQLite value to bind. Arrays and
/// objects never appear in practice; they degrade to their JSON text.
pub fn to_sql_value(value: &Value) -> rusqlite::types::Value {
  use rusqlite::types::Value as Sql;
  match value {
    Value::Null => Sql::Null,
    Value::Bool(b) => Sql::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => Sql::Integer(i),
      None => Sql::Real(n.as_f64().unwrap_or(0.0)),
    },
    Value::String(s) => Sql::Text(s.clone()),
    other => Sql::Text(other.to_string()),
  }
}

/// Convert a stored SQLite value back into a JSON field value.
pub fn from_sql_value(value: rusqlite::types::Value) -> Value {
  use rusqlite::types::Value as Sql;
  match value {
    Sql::Null => Value::Null,
    Sql::Integer(i) => Value::Number(Number::from(i)),
    Sql::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
    Sql::Text(s) => Value::String(s),
    // We never write blobs; tolerate one as an unset value.
    Sql::Blob(_) => Value::Null,
  }
}

/// Read the business columns of an `opportunities` row into a field map.
/// `offset` is the index of the first business column in the SELECT list.
pub fn read_fields(
  row: &rusqlite::Row<'_>,
  offset: usize,
) -> rusqlite::Result<Map<String, Value>> {
  let mut map = Map::new();
  for (i, col) in fields::COLUMNS.iter().enumerate() {
    let value: rusqlite::types::Value = row.get(offset + i)?;
    map.insert((*col).to_owned(), from_sql_value(value));
  }
  Ok(map)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `opportunities` row.
pub struct RawOpportunity {
  pub uid:        String,
  pub created_at: String,
  pub fields:     Map<String, Value>,
}

impl RawOpportunity {
  pub fn into_opportunity(self) -> Result<Opportunity> {
    Ok(Opportunity {
      uid:        decode_uuid(&self.uid)?,
      created_at: decode_dt(&self.created_at)?,
      fields:     self.fields,
    })
  }
}

/// Raw strings read directly from an `opportunity_revisions` row.
pub struct RawRevision {
  pub opportunity_uid: String,
  pub revision_number: i64,
  pub changed_by:      Option<String>,
  pub changed_at:      String,
  pub snapshot:        String,
}

impl RawRevision {
  pub fn into_entry(self) -> Result<RevisionEntry> {
    Ok(RevisionEntry {
      opportunity_uid: decode_uuid(&self.opportunity_uid)?,
      revision_number: self.revision_number,
      changed_by:      self.changed_by,
      changed_at:      decode_dt(&self.changed_at)?,
      snapshot:        serde_json::from_str(&self.snapshot)?,
    })
  }
}

/// Raw strings read directly from a `forecast_revisions` row.
pub struct RawForecastChange {
  pub id:                i64,
  pub opportunity_uid:   String,
  pub old_forecast_date: Option<String>,
  pub new_forecast_date: String,
  pub changed_by:        Option<String>,
  pub changed_at:        String,
  pub comment:           Option<String>,
}

impl RawForecastChange {
  pub fn into_change(self) -> Result<ForecastChange> {
    Ok(ForecastChange {
      id:                self.id,
      opportunity_uid:   decode_uuid(&self.opportunity_uid)?,
      old_forecast_date: self.old_forecast_date,
      new_forecast_date: self.new_forecast_date,
      changed_by:        self.changed_by,
      changed_at:        decode_dt(&self.changed_at)?,
      comment:           self.comment,
    })
  }
}
