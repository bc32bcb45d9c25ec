//! Win/loss dashboard support: distinct values for filter dropdowns.

use opptrack_core::opportunity::Opportunity;

/// The sorted, deduplicated, non-empty string values of one field across
/// `records`. Used to populate the solutions and account-manager filters.
pub fn distinct_values(records: &[Opportunity], field: &str) -> Vec<String> {
  let mut values: Vec<String> = records
    .iter()
    .filter_map(|opp| opp.field(field))
    .filter_map(|v| v.as_str())
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect();
  values.sort();
  values.dedup();
  values
}
