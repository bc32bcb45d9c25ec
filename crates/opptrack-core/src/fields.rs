//! The canonical business-column registry.
//!
//! Field names arriving from clients are inconsistent ("Client Deadline",
//! `client_deadline`, `clientdeadline`); every lookup goes through
//! [`normalize`] so all spellings resolve to one canonical column.

/// The reserved primary-key column. Assigned once at creation and stripped
/// from every inbound payload, in any casing.
pub const UID: &str = "uid";

/// Every mutable business column, in schema order.
pub const COLUMNS: &[&str] = &[
  "project_name",
  "client",
  "account_mgr",
  "solutions",
  "opp_status",
  "decision",
  "revision",
  "final_amt",
  "margin",
  "client_deadline",
  "submitted_date",
  "date_awarded_lost",
  "forecast_date",
  "remarks",
];

/// The fixed projection recorded in each revision-ledger snapshot.
/// Widening audit coverage means extending this list, nothing else.
pub const SNAPSHOT_COLUMNS: &[&str] = &[
  "revision",
  "final_amt",
  "margin",
  "client_deadline",
  "submitted_date",
  "forecast_date",
];

/// Lowercase a field name and drop separator characters so that all
/// observed spellings of a column compare equal.
pub fn normalize(name: &str) -> String {
  name
    .chars()
    .filter(|&c| !matches!(c, ' ' | '_' | '-'))
    .flat_map(char::to_lowercase)
    .collect()
}

/// Resolve an inbound field name to its canonical column, if any.
pub fn resolve(name: &str) -> Option<&'static str> {
  let norm = normalize(name);
  COLUMNS.iter().copied().find(|col| normalize(col) == norm)
}

/// Whether `name` is the protected primary-key column in any spelling.
pub fn is_reserved(name: &str) -> bool {
  normalize(name) == UID
}
