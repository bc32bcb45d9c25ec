//! Opportunity records and the sanitized inputs that mutate them.
//!
//! An opportunity is a thin envelope (uid + creation timestamp) around a
//! flat map of business-field values. Values are kept as JSON values
//! because the source data is dynamically typed: amounts arrive as numbers
//! or formatted strings, dates as strings, counters as either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result, fields};

// ─── Opportunity ─────────────────────────────────────────────────────────────

/// A stored opportunity record. `uid` and `created_at` are server-assigned;
/// everything else lives in `fields`, keyed by canonical column name with
/// every registry column present (null when unset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
  pub uid:        Uuid,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub fields:     Map<String, Value>,
}

impl Opportunity {
  /// Look up a field by any spelling of its name.
  pub fn field(&self, name: &str) -> Option<&Value> {
    let canonical = fields::resolve(name)?;
    self.fields.get(canonical)
  }

  /// The record's current revision counter; 0 when absent or non-numeric.
  pub fn revision_number(&self) -> i64 {
    parse_revision(self.fields.get("revision")).unwrap_or(0)
  }
}

// ─── Revision parsing ────────────────────────────────────────────────────────

/// Interpret a stored or supplied `revision` value as a number.
///
/// Numbers count as themselves, numeric strings are parsed; anything else
/// (absent, null, malformed) yields `None` and the caller falls back to its
/// default. Malformed values are deliberately tolerated rather than
/// rejected so a bad counter in a payload reads as "no revision change".
pub fn parse_revision(value: Option<&Value>) -> Option<i64> {
  match value? {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
    Value::String(s) => {
      let trimmed = s.trim();
      trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
    }
    _ => None,
  }
}

// ─── Sanitization ────────────────────────────────────────────────────────────

/// Canonicalize a raw payload map: strip the reserved uid key in any
/// casing, resolve every remaining key against the registry, and normalize
/// empty-string values to null (empty string is not a distinct state from
/// "no value").
fn sanitize(raw: Map<String, Value>) -> Result<Map<String, Value>> {
  let mut out = Map::new();
  for (key, value) in raw {
    if fields::is_reserved(&key) {
      continue;
    }
    let canonical = fields::resolve(&key).ok_or(Error::UnknownField(key))?;
    let value = match value {
      Value::String(s) if s.trim().is_empty() => Value::Null,
      other => other,
    };
    out.insert(canonical.to_owned(), value);
  }
  Ok(out)
}

// ─── NewOpportunity ──────────────────────────────────────────────────────────

/// Sanitized input to `create_opportunity`. `uid` and `created_at` are
/// always assigned by the store; they are not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
  fields: Map<String, Value>,
}

impl NewOpportunity {
  /// Build from a raw payload map. An empty payload is allowed; the record
  /// is created with every column unset.
  pub fn from_raw(raw: Map<String, Value>) -> Result<Self> {
    Ok(Self { fields: sanitize(raw)? })
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  pub fn into_fields(self) -> Map<String, Value> {
    self.fields
  }
}

// ─── UpdatePatch ─────────────────────────────────────────────────────────────

/// Sanitized partial update for one opportunity. Construction is the
/// validation step: a patch that exists is guaranteed non-empty and keyed
/// by canonical column names, so the store never opens a transaction for
/// unusable input.
#[derive(Debug, Clone)]
pub struct UpdatePatch {
  fields: Map<String, Value>,
}

impl UpdatePatch {
  pub fn from_raw(raw: Map<String, Value>) -> Result<Self> {
    let fields = sanitize(raw)?;
    if fields.is_empty() {
      return Err(Error::EmptyUpdate);
    }
    Ok(Self { fields })
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  pub fn into_fields(self) -> Map<String, Value> {
    self.fields
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn raw(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
      .iter()
      .map(|(k, v)| ((*k).to_owned(), v.clone()))
      .collect()
  }

  #[test]
  fn patch_strips_uid_in_any_casing() {
    let patch = UpdatePatch::from_raw(raw(&[
      ("uid", json!("a")),
      ("UID", json!("b")),
      ("Uid", json!("c")),
      ("client", json!("ACME")),
    ]))
    .unwrap();
    assert_eq!(patch.fields().len(), 1);
    assert_eq!(patch.fields().get("client"), Some(&json!("ACME")));
  }

  #[test]
  fn patch_of_only_reserved_keys_is_empty() {
    let err = UpdatePatch::from_raw(raw(&[("uid", json!("x"))])).unwrap_err();
    assert!(matches!(err, Error::EmptyUpdate));
  }

  #[test]
  fn patch_rejects_unknown_fields() {
    let err =
      UpdatePatch::from_raw(raw(&[("favourite_colour", json!("red"))]))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField(name) if name == "favourite_colour"));
  }

  #[test]
  fn patch_canonicalizes_key_spelling() {
    let patch =
      UpdatePatch::from_raw(raw(&[("Client Deadline", json!("2025-06-01"))]))
        .unwrap();
    assert_eq!(
      patch.fields().get("client_deadline"),
      Some(&json!("2025-06-01"))
    );
  }

  #[test]
  fn empty_strings_normalize_to_null() {
    let patch =
      UpdatePatch::from_raw(raw(&[("remarks", json!("  "))])).unwrap();
    assert_eq!(patch.fields().get("remarks"), Some(&Value::Null));
  }

  #[test]
  fn new_opportunity_allows_empty_payload() {
    let input = NewOpportunity::from_raw(Map::new()).unwrap();
    assert!(input.fields().is_empty());
  }

  #[test]
  fn revision_number_defaults_to_zero() {
    let mut opp = Opportunity {
      uid:        Uuid::nil(),
      created_at: DateTime::UNIX_EPOCH,
      fields:     Map::new(),
    };
    assert_eq!(opp.revision_number(), 0);

    opp.fields.insert("revision".into(), json!("2"));
    assert_eq!(opp.revision_number(), 2);
  }

  #[test]
  fn parse_revision_handles_numbers_and_numeric_strings() {
    assert_eq!(parse_revision(Some(&json!(3))), Some(3));
    assert_eq!(parse_revision(Some(&json!(2.9))), Some(2));
    assert_eq!(parse_revision(Some(&json!("4"))), Some(4));
    assert_eq!(parse_revision(Some(&json!(" 5 "))), Some(5));
  }

  #[test]
  fn parse_revision_falls_back_on_malformed_input() {
    assert_eq!(parse_revision(None), None);
    assert_eq!(parse_revision(Some(&Value::Null)), None);
    assert_eq!(parse_revision(Some(&json!("rev-two"))), None);
    assert_eq!(parse_revision(Some(&json!(true))), None);
  }
}
