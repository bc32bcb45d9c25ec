//! Flexible date parsing for date-bearing fields.
//!
//! Stored values mix ISO strings, slash-separated spreadsheet formats, and
//! raw Excel serial numbers, depending on how the row entered the system.
//! `None` means "no usable date"; callers skip such records.

use chrono::{Days, NaiveDate};
use serde_json::Value;

/// Excel serial number for 1970-01-01 on the Windows (1900) epoch. Serials
/// at or below this are more likely row ids than dates and are ignored.
const EXCEL_UNIX_BOUNDARY: f64 = 25_569.0;

/// Parse a field value into a calendar date.
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
  match value {
    Value::String(s) => parse_flexible(s),
    Value::Number(n) => from_excel_serial(n.as_f64()?),
    _ => None,
  }
}

/// Parse a date string in any of the formats observed in the data:
/// `Y-m-d` (optionally with a time suffix), `m/d/Y`, `d/m/Y` when the
/// first component cannot be a month, and `Y/m/d`.
pub fn parse_flexible(s: &str) -> Option<NaiveDate> {
  let trimmed = s.trim();
  if trimmed.is_empty() {
    return None;
  }

  // Drop any time suffix so "2025-03-01T00:00:00Z" parses as its date.
  let date_part = trimmed
    .split(['T', ' '])
    .next()
    .unwrap_or(trimmed);

  for format in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"] {
    if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
      return Some(date);
    }
  }
  None
}

/// Convert an Excel serial date (Windows 1900 epoch) to a calendar date.
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
  if serial <= EXCEL_UNIX_BOUNDARY {
    return None;
  }
  NaiveDate::from_ymd_opt(1899, 12, 30)?
    .checked_add_days(Days::new(serial as u64))
}
