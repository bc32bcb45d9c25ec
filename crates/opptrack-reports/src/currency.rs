//! Lenient currency parsing for amount fields.
//!
//! Amounts arrive either as plain numbers or as display strings like
//! `"₱1,250,000.50"` or `"(5,000)"` (accounting negative). Unparseable
//! input counts as zero so one bad cell cannot sink a whole report.

use serde_json::Value;

/// Parse an amount field value into a float.
pub fn parse_amount(value: &Value) -> f64 {
  match value {
    Value::Number(n) => n.as_f64().unwrap_or(0.0),
    Value::String(s) => parse_amount_str(s),
    _ => 0.0,
  }
}

/// Parse a display-formatted amount string.
pub fn parse_amount_str(s: &str) -> f64 {
  let cleaned: String = s
    .chars()
    .filter(|&c| !matches!(c, '₱' | ','))
    .collect::<String>()
    .trim()
    .to_owned();

  if let Some(inner) = cleaned
    .strip_prefix('(')
    .and_then(|rest| rest.strip_suffix(')'))
  {
    return inner.trim().parse::<f64>().map_or(0.0, |v| -v);
  }

  cleaned.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn numbers_pass_through() {
    assert_eq!(parse_amount(&json!(1500)), 1500.0);
    assert_eq!(parse_amount(&json!(1500.25)), 1500.25);
  }

  #[test]
  fn display_strings_are_cleaned() {
    assert_eq!(parse_amount_str("₱1,250,000.50"), 1_250_000.50);
    assert_eq!(parse_amount_str(" 42 "), 42.0);
  }

  #[test]
  fn parenthesized_amounts_are_negative() {
    assert_eq!(parse_amount_str("(5,000)"), -5000.0);
  }

  #[test]
  fn garbage_counts_as_zero() {
    assert_eq!(parse_amount_str("TBD"), 0.0);
    assert_eq!(parse_amount(&json!(null)), 0.0);
    assert_eq!(parse_amount(&json!(["nope"])), 0.0);
  }
}
