//! Snapshot builder: the fixed-field projection stored in the revision
//! ledger.
//!
//! The same function builds the pre-update and post-update snapshots, so
//! the two are structurally comparable entry for entry.

use serde_json::{Map, Value};

use crate::fields;

/// Look up a value by any spelling of its field name.
pub fn lookup_insensitive<'a>(
  fields_map: &'a Map<String, Value>,
  name: &str,
) -> Option<&'a Value> {
  let target = fields::normalize(name);
  fields_map
    .iter()
    .find(|(key, _)| fields::normalize(key) == target)
    .map(|(_, value)| value)
}

/// Project the audit columns out of a record's field map. Every column in
/// [`fields::SNAPSHOT_COLUMNS`] appears in the result, null when missing.
pub fn build_snapshot(fields_map: &Map<String, Value>) -> Map<String, Value> {
  let mut snap = Map::new();
  for &col in fields::SNAPSHOT_COLUMNS {
    let value = lookup_insensitive(fields_map, col)
      .cloned()
      .unwrap_or(Value::Null);
    snap.insert(col.to_owned(), value);
  }
  snap
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn snapshot_contains_every_audit_column() {
    let snap = build_snapshot(&Map::new());
    assert_eq!(snap.len(), fields::SNAPSHOT_COLUMNS.len());
    assert!(snap.values().all(Value::is_null));
  }

  #[test]
  fn snapshot_projects_only_audit_columns() {
    let mut fields_map = Map::new();
    fields_map.insert("final_amt".into(), json!(5000));
    fields_map.insert("project_name".into(), json!("Bridge"));

    let snap = build_snapshot(&fields_map);
    assert_eq!(snap.get("final_amt"), Some(&json!(5000)));
    assert!(!snap.contains_key("project_name"));
  }

  #[test]
  fn lookup_tolerates_inconsistent_key_spelling() {
    let mut fields_map = Map::new();
    fields_map.insert("Client Deadline".into(), json!("2025-06-01"));

    let snap = build_snapshot(&fields_map);
    assert_eq!(snap.get("client_deadline"), Some(&json!("2025-06-01")));
  }
}
